use super::constants::{MAX_LISTED_ROOMS, ROOM_ID_LENGTH};
use super::room::{LeaveOutcome, Room};
use super::types::{RoomSettings, Visibility};
use crate::error::JoinError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomListing {
    pub id: String,
    pub name: String,
}

/// Every live room by id. Rooms leave the map once their last player goes or
/// the idle sweep closes them.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: DashMap<String, Arc<Room>>,
    tick_interval: Duration,
}

impl RoomRegistry {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            rooms: DashMap::new(),
            tick_interval,
        }
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn create_room(
        &self,
        name: String,
        visibility: Visibility,
        settings: RoomSettings,
    ) -> String {
        loop {
            let id: String = Uuid::new_v4()
                .simple()
                .to_string()
                .chars()
                .take(ROOM_ID_LENGTH)
                .collect();
            match self.rooms.entry(id.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(entry) => {
                    tracing::info!(
                        room_id = %id,
                        room_name = %name,
                        public = visibility == Visibility::Public,
                        "room created"
                    );
                    let room = Room::new(id.clone(), name, visibility, settings, self.tick_interval);
                    entry.insert(Arc::new(room));
                    return id;
                }
            }
        }
    }

    pub fn room(&self, id: &str) -> Option<Arc<Room>> {
        self.rooms.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn room_exists(&self, id: &str) -> bool {
        self.room(id).map_or(false, |room| !room.is_closed())
    }

    /// Public rooms with a free seat, at most `min(limit, 15)` of them.
    pub fn list_public_rooms(&self, limit: usize) -> Vec<RoomListing> {
        self.rooms
            .iter()
            .filter(|entry| entry.value().is_listable())
            .take(limit.min(MAX_LISTED_ROOMS))
            .map(|entry| RoomListing {
                id: entry.key().clone(),
                name: entry.value().name().to_string(),
            })
            .collect()
    }

    pub async fn join(
        &self,
        room_id: &str,
        player_id: &str,
        sender: UnboundedSender<String>,
    ) -> Result<Arc<Room>, JoinError> {
        let room = self
            .room(room_id)
            .ok_or_else(|| JoinError::NotFound(room_id.to_string()))?;
        room.join(player_id, sender).await?;
        Ok(room)
    }

    pub async fn leave(&self, room_id: &str, player_id: &str) {
        let Some(room) = self.room(room_id) else { return };
        if room.leave(player_id).await == LeaveOutcome::Emptied {
            self.rooms.remove_if(room_id, |_, room| room.is_closed());
        }
    }

    /// Drops rooms that nobody joined within `max_idle`. Returns how many
    /// were removed.
    pub async fn sweep_idle(&self, max_idle: Duration) -> usize {
        let rooms: Vec<Arc<Room>> = self
            .rooms
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut removed = 0;
        for room in rooms {
            if !room.close_if_idle(max_idle).await {
                continue;
            }
            if self
                .rooms
                .remove_if(room.id(), |_, room| room.is_closed())
                .is_some()
            {
                tracing::info!(room_id = room.id(), "idle room removed");
                removed += 1;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn make_registry() -> RoomRegistry {
        RoomRegistry::new(Duration::from_millis(142))
    }

    fn create(registry: &RoomRegistry, name: &str, visibility: Visibility) -> String {
        registry.create_room(name.to_string(), visibility, RoomSettings::default())
    }

    async fn join(registry: &RoomRegistry, room_id: &str, player_id: &str) -> Result<(), JoinError> {
        let (tx, _rx) = mpsc::unbounded_channel();
        registry.join(room_id, player_id, tx).await.map(|_| ())
    }

    #[test]
    fn created_rooms_get_short_ids() {
        let registry = make_registry();
        let id = create(&registry, "Lobby", Visibility::Public);

        assert_eq!(id.len(), ROOM_ID_LENGTH);
        assert!(id.chars().all(|ch| ch.is_ascii_hexdigit()));
        assert!(registry.room_exists(&id));
        assert!(!registry.room_exists("nope"));
        assert_eq!(registry.room(&id).unwrap().name(), "Lobby");
    }

    #[test]
    fn listing_skips_private_rooms_and_caps_results() {
        let registry = make_registry();
        create(&registry, "Hidden", Visibility::Private);
        for index in 0..20 {
            create(&registry, &format!("Room {index}"), Visibility::Public);
        }

        let listed = registry.list_public_rooms(100);
        assert_eq!(listed.len(), MAX_LISTED_ROOMS);
        assert!(listed.iter().all(|room| room.name != "Hidden"));
        assert_eq!(registry.list_public_rooms(3).len(), 3);
    }

    #[tokio::test]
    async fn full_rooms_reject_and_drop_out_of_listing() {
        let registry = make_registry();
        let id = create(&registry, "Duel", Visibility::Public);

        join(&registry, &id, "a").await.unwrap();
        assert_eq!(registry.list_public_rooms(15).len(), 1);
        join(&registry, &id, "b").await.unwrap();

        assert!(registry.list_public_rooms(15).is_empty());
        assert!(matches!(join(&registry, &id, "c").await, Err(JoinError::Full)));
    }

    #[tokio::test]
    async fn unknown_room_is_not_found() {
        let registry = make_registry();
        let error = join(&registry, "zzzzzz", "a").await.unwrap_err();
        assert_eq!(error.to_string(), "room zzzzzz not found");
    }

    #[tokio::test(start_paused = true)]
    async fn running_game_rejects_newcomers() {
        let registry = make_registry();
        let id = create(&registry, "Duel", Visibility::Public);
        join(&registry, &id, "a").await.unwrap();
        join(&registry, &id, "b").await.unwrap();

        let room = registry.room(&id).unwrap();
        room.set_ready("a", true).await;
        room.set_ready("b", true).await;
        registry.leave(&id, "b").await;

        assert!(matches!(
            join(&registry, &id, "c").await,
            Err(JoinError::InProgress)
        ));
    }

    #[tokio::test]
    async fn last_leave_removes_the_room() {
        let registry = make_registry();
        let id = create(&registry, "Duel", Visibility::Public);
        join(&registry, &id, "a").await.unwrap();
        join(&registry, &id, "b").await.unwrap();

        registry.leave(&id, "a").await;
        assert!(registry.room_exists(&id));
        registry.leave(&id, "b").await;

        assert!(!registry.room_exists(&id));
        assert_eq!(registry.len(), 0);
        assert!(matches!(
            join(&registry, &id, "c").await,
            Err(JoinError::NotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_only_stale_empty_rooms() {
        let registry = make_registry();
        let stale = create(&registry, "Stale", Visibility::Public);
        let occupied = create(&registry, "Busy", Visibility::Public);
        join(&registry, &occupied, "a").await.unwrap();

        tokio::time::advance(Duration::from_secs(601)).await;
        let fresh = create(&registry, "Fresh", Visibility::Public);

        assert_eq!(registry.sweep_idle(Duration::from_secs(600)).await, 1);
        assert!(!registry.room_exists(&stale));
        assert!(registry.room_exists(&occupied));
        assert!(registry.room_exists(&fresh));
    }
}
