//! Service-specific tests
//!
//! One file per service implementation.


pub mod common {
    use shared::{Coordinate, StateSnapshot, User, UserId, Role};

    pub fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).expect("valid test coordinate")
    }

    pub fn snapshot_with_user(name: &str) -> StateSnapshot {
        StateSnapshot {
            users: vec![User {
                id: UserId::new(),
                name: name.to_string(),
                phone: "555 0101".to_string(),
                role: Role::Customer,
                category: None,
            }],
            ..StateSnapshot::default()
        }
    }
}
