//! In-memory user store.
//!
//! One mutex guards the whole collection. Each method is a single critical
//! section, so "max id + 1 then append" and "find, check, then mutate" are
//! atomic with respect to every other request.

use std::sync::{Mutex, MutexGuard};

use super::model::{User, UserFields, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A previous holder of the lock panicked mid-operation.
    #[error("user store lock poisoned")]
    Poisoned,
    /// The highest stored id is `UserId::MAX`, so there is no next one.
    #[error("no user ids left after {0}")]
    IdsExhausted(UserId),
}

/// Ordered collection of users, in insertion order.
#[derive(Debug, Default)]
pub struct UserStore {
    users: Mutex<Vec<User>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The two records every process starts with.
    pub fn seeded() -> Self {
        Self::from_users(vec![
            User::new(1, "Alice", "alice@example.com"),
            User::new(2, "Bob", "bob@example.com"),
        ])
    }

    pub fn from_users(users: Vec<User>) -> Self {
        Self { users: Mutex::new(users) }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<User>>, StoreError> {
        self.users.lock().map_err(|_| StoreError::Poisoned)
    }

    pub fn list(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.lock()?.clone())
    }

    pub fn get(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.iter().find(|u| u.id == id).cloned())
    }

    /// Appends a new user with id = highest existing id + 1, or 1 when empty.
    pub fn insert(&self, fields: UserFields) -> Result<User, StoreError> {
        let mut users = self.lock()?;
        let id = match users.iter().map(|u| u.id).max() {
            None => 1,
            Some(max) => max.checked_add(1).ok_or(StoreError::IdsExhausted(max))?,
        };
        let user = User { id, name: fields.name, email: fields.email };
        users.push(user.clone());
        Ok(user)
    }

    /// Runs `f` on the user with `id` while holding the lock.
    /// `Ok(None)` when there is no such user.
    pub fn modify<T>(
        &self,
        id: UserId,
        f: impl FnOnce(&mut User) -> T,
    ) -> Result<Option<T>, StoreError> {
        let mut users = self.lock()?;
        Ok(users.iter_mut().find(|u| u.id == id).map(f))
    }

    /// Replaces name and email of the user with `id`.
    pub fn update(&self, id: UserId, fields: UserFields) -> Result<Option<User>, StoreError> {
        self.modify(id, |user| {
            user.apply(fields);
            user.clone()
        })
    }

    /// Removes and returns the user with `id`.
    pub fn remove(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let mut users = self.lock()?;
        Ok(users.iter().position(|u| u.id == id).map(|i| users.remove(i)))
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.is_empty())
    }

    /// Panics while holding the lock, leaving it poisoned.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::thread::scope(|s| {
            s.spawn(|| {
                let _guard = self.users.lock();
                panic!("poisoning user store");
            })
            .join()
        });
    }
}
