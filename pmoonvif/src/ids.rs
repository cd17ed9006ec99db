//! Sources d'identifiants aléatoires
//!
//! Les nonces WS-Security et les `MessageID` WS-Discovery sont tirés d'un
//! [`IdSource`] injecté, ce qui permet des tests déterministes.

use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// Fournit un nouvel UUID à chaque appel.
pub trait IdSource: Send + Sync {
    fn next_uuid(&self) -> Uuid;
}

/// UUID v4 tirés du générateur aléatoire du thread courant.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_uuid(&self) -> Uuid {
        uuid::Builder::from_random_bytes(rand::random()).into_uuid()
    }
}

/// Séquence fixe d'UUID, rejouée en boucle.
///
/// Une séquence vide produit toujours [`Uuid::nil`].
#[derive(Debug, Default)]
pub struct FixedIds {
    ids: Vec<Uuid>,
    cursor: AtomicUsize,
}

impl FixedIds {
    pub fn new(ids: Vec<Uuid>) -> Self {
        Self {
            ids,
            cursor: AtomicUsize::new(0),
        }
    }
}

impl IdSource for FixedIds {
    fn next_uuid(&self) -> Uuid {
        if self.ids.is_empty() {
            return Uuid::nil();
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.ids.len();
        self.ids[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_ids_are_v4_and_distinct() {
        let ids = RandomIds;
        let a = ids.next_uuid();
        let b = ids.next_uuid();

        assert_eq!(a.get_version_num(), 4);
        assert_ne!(a, b);
    }

    #[test]
    fn test_fixed_ids_cycle() {
        let first = Uuid::from_u128(1);
        let second = Uuid::from_u128(2);
        let ids = FixedIds::new(vec![first, second]);

        assert_eq!(ids.next_uuid(), first);
        assert_eq!(ids.next_uuid(), second);
        assert_eq!(ids.next_uuid(), first);
    }

    #[test]
    fn test_fixed_ids_empty_is_nil() {
        let ids = FixedIds::default();
        assert!(ids.next_uuid().is_nil());
    }
}
