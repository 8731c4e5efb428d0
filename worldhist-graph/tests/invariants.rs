//! Integration coverage for the §8 invariants that only show up across a
//! sequence of mutations rather than within a single `Graph` method.

use worldhist_core::{Kind, Status};
use worldhist_graph::{EntityCriteria, EntitySettings, Graph};

#[test]
fn at_most_one_current_era_across_transitions() {
    let mut graph = Graph::new();
    let era_a = graph
        .create_entity(
            EntitySettings::new(Kind::Era, "early", "The Early Age").status(Status::Current),
        )
        .unwrap();
    assert!(graph.check_single_current_era());

    let era_b = graph
        .create_entity(
            EntitySettings::new(Kind::Era, "mid", "The Middle Age").status(Status::Future),
        )
        .unwrap();
    assert!(graph.check_single_current_era());

    graph
        .update_entity(era_a, worldhist_graph::EntityPatch::new().with_status(Status::Historical))
        .unwrap();
    graph
        .update_entity(era_b, worldhist_graph::EntityPatch::new().with_status(Status::Current))
        .unwrap();
    assert!(graph.check_single_current_era());

    let eras = graph.find_entities(&EntityCriteria::new().with_kind(Kind::Era));
    assert_eq!(eras.len(), 2);
}

#[test]
fn timestamps_stay_ordered_across_many_ticks() {
    let mut graph = Graph::new();
    for t in 0..50 {
        graph.tick = t;
        let id = graph
            .create_entity(EntitySettings::new(Kind::Npc, "commoner", format!("npc-{t}")))
            .unwrap();
        graph
            .update_entity(id, worldhist_graph::EntityPatch::new().with_status(Status::Active))
            .unwrap();
    }
    assert!(graph.check_timestamps_ordered());
}

#[test]
fn links_stay_consistent_through_archival_and_culling() {
    let mut graph = Graph::new();
    let a = graph
        .create_entity(EntitySettings::new(Kind::Faction, "clan", "Clan A"))
        .unwrap();
    let b = graph
        .create_entity(EntitySettings::new(Kind::Faction, "clan", "Clan B"))
        .unwrap();
    let c = graph
        .create_entity(EntitySettings::new(Kind::Faction, "clan", "Clan C"))
        .unwrap();
    graph.add_relationship("rivalry", a, b, None, None, None);
    graph.add_relationship("rivalry", a, c, None, None, None);
    assert!(graph.check_links_consistent());

    graph.archive_entity(b, worldhist_graph::ArchiveOptions::default());
    assert!(graph.check_links_consistent());
    assert!(graph.check_relationship_endpoints_live());

    graph.remove_relationship(a, c, "rivalry");
    assert!(graph.check_links_consistent());
}
