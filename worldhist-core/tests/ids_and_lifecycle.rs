//! Cross-module coverage for the primitives every other crate builds on:
//! opaque id round-tripping, the monotone status lattice, and prominence
//! clamping at the lattice's ends (§3 invariants 4 and 6).

use worldhist_core::{EntityId, Prominence, Status};

#[test]
fn entity_and_relationship_ids_are_distinguishable_types() {
    let raw = uuid::Uuid::new_v4();
    let entity = EntityId::from_uuid(raw);
    let parsed: EntityId = entity.to_string().parse().unwrap();
    assert_eq!(entity, parsed);
    assert_eq!(entity.as_uuid(), raw);
}

#[test]
fn status_transitions_never_leave_historical() {
    let mut status = Status::Future;
    for next in [Status::Active, Status::Historical] {
        assert!(status.can_transition_to(next));
        status = next;
    }
    for attempt in [Status::Future, Status::Active, Status::Current] {
        assert!(!status.can_transition_to(attempt));
    }
}

#[test]
fn prominence_steps_clamp_at_both_ends() {
    let mut p = Prominence::Forgotten;
    p = p.step_down();
    assert_eq!(p, Prominence::Forgotten);

    let mut p = Prominence::Mythic;
    p = p.step_up();
    assert_eq!(p, Prominence::Mythic);
}
