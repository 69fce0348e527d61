/// Shared Room example: two players meet in a room and trade their final choice.
///
/// Both clients talk to the same in-memory store, standing in for the
/// browser storage two tabs would share.
///
/// Run with: cargo run --example shared_room

use std::rc::Rc;
use winter_kindling::core::clock::{Clock, ManualClock};
use winter_kindling::core::ending::ending_for_consequence;
use winter_kindling::core::multiplayer::{RoomClient, SharedProgress, POLL_INTERVAL_MS};
use winter_kindling::core::persistence::{KeyValueStore, MemoryStore};
use winter_kindling::schema::choice::Choice;
use winter_kindling::schema::difficulty::Role;

fn main() {
    let store: Rc<dyn KeyValueStore> = Rc::new(MemoryStore::new());
    let clock = ManualClock::new(0);
    let clock_handle: Rc<dyn Clock> = Rc::new(clock.clone());

    let mut giver = RoomClient::new(Rc::clone(&store), Rc::clone(&clock_handle));
    let mut seeker = RoomClient::new(Rc::clone(&store), Rc::clone(&clock_handle));

    // --- Meet ---
    let code = giver.create_room(Role::Giver).expect("Failed to create room");
    println!("Giver opened room {code}");
    seeker
        .join_room(&code, Role::Seeker)
        .expect("Failed to join room");
    println!("Seeker joined room {code}");

    giver.set_ready(true).expect("Failed to mark giver ready");
    seeker.set_ready(true).expect("Failed to mark seeker ready");

    clock.advance(POLL_INTERVAL_MS);
    for event in giver.poll().expect("Giver poll failed") {
        println!("  giver sees: {event:?}");
    }

    // --- Play ---
    giver
        .sync_progress(SharedProgress {
            current_chapter: 5,
            current_level: 3,
            combined_kindling: 1240,
        })
        .expect("Failed to sync progress");

    giver
        .send_choice(Choice {
            text: "Wish for the cycle to transform".to_string(),
            consequence: "transformation".to_string(),
            kindling: 100,
        })
        .expect("Failed to send giver choice");
    seeker
        .send_choice(Choice {
            text: "Wish for her happiness".to_string(),
            consequence: "compassionate-twist".to_string(),
            kindling: 100,
        })
        .expect("Failed to send seeker choice");

    clock.advance(POLL_INTERVAL_MS);
    for event in seeker.poll().expect("Seeker poll failed") {
        println!("  seeker sees: {event:?}");
    }

    if let Some((host, guest)) = giver.both_choices().expect("Failed to read choices") {
        println!("\nGiver chose:  {} -> {}", host.text, ending_for_consequence(&host.consequence));
        println!("Seeker chose: {} -> {}", guest.text, ending_for_consequence(&guest.consequence));
    }

    // --- Part ---
    seeker.leave_room().expect("Failed to leave room");
    clock.advance(POLL_INTERVAL_MS);
    for event in giver.poll().expect("Giver poll failed") {
        println!("  giver sees: {event:?}");
    }
}
