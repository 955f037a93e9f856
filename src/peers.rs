// ============================================
// peers.rs - User/Chat collection
// ============================================
// Accumulates users and chats from incoming batches into
// long-lived lookup tables. A "min" record is a partial copy
// sent when the full one was not included in a batch; it must
// never overwrite a full record already stored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub min: bool,
    #[serde(default)]
    pub access_hash: Option<i64>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// A basic group. Groups have no min form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: i64,
    #[serde(default)]
    pub min: bool,
    #[serde(default)]
    pub access_hash: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Chat {
    Group(Group),
    Channel(Channel),
}

impl Chat {
    pub fn id(&self) -> i64 {
        match self {
            Chat::Group(group) => group.id,
            Chat::Channel(channel) => channel.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Chat::Group(group) => &group.title,
            Chat::Channel(channel) => &channel.title,
        }
    }

    pub fn as_channel(&self) -> Option<&Channel> {
        match self {
            Chat::Channel(channel) => Some(channel),
            Chat::Group(_) => None,
        }
    }
}

/// Anything carrying users and chats (an API response, an update...).
///
/// Records are stored under their own id, whatever key the source uses.
pub trait PeerSource {
    fn users(&self) -> &HashMap<i64, User>;
    fn chats(&self) -> &HashMap<i64, Chat>;
}

/// An owned batch of users and chats, as loaded from JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerBatch {
    #[serde(default, with = "keyed_by_id")]
    pub users: HashMap<i64, User>,
    #[serde(default, with = "keyed_by_id")]
    pub chats: HashMap<i64, Chat>,
}

impl PeerBatch {
    pub fn new<U, C>(users: U, chats: C) -> Self
    where
        U: IntoIterator<Item = User>,
        C: IntoIterator<Item = Chat>,
    {
        Self {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
            chats: chats.into_iter().map(|c| (c.id(), c)).collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }
}

impl PeerSource for PeerBatch {
    fn users(&self) -> &HashMap<i64, User> {
        &self.users
    }

    fn chats(&self) -> &HashMap<i64, Chat> {
        &self.chats
    }
}

/// Batches list their records as JSON arrays; the tables are keyed by id.
mod keyed_by_id {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    pub trait Keyed {
        fn key(&self) -> i64;
    }

    impl Keyed for super::User {
        fn key(&self) -> i64 {
            self.id
        }
    }

    impl Keyed for super::Chat {
        fn key(&self) -> i64 {
            self.id()
        }
    }

    pub fn serialize<T, S>(map: &HashMap<i64, T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        let mut records: Vec<(&i64, &T)> = map.iter().collect();
        records.sort_by_key(|(id, _)| **id);
        serializer.collect_seq(records.into_iter().map(|(_, record)| record))
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<HashMap<i64, T>, D::Error>
    where
        T: Deserialize<'de> + Keyed,
        D: Deserializer<'de>,
    {
        let records = Vec::<T>::deserialize(deserializer)?;
        Ok(records.into_iter().map(|r| (r.key(), r)).collect())
    }
}

/// Whether an incoming record may replace what is stored.
///
/// `existing_min` is `None` when nothing comparable is stored.
fn should_store(incoming_min: bool, existing_min: Option<bool>) -> bool {
    !incoming_min || existing_min.unwrap_or(true)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Every write leaves the map consistent, so a poisoned lock is still usable.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Accumulate the users/chats of `source` into `users` and `chats`, ignoring
/// min records when the full record is already stored.
///
/// Each table is locked for its whole pass, so concurrent merges into the same
/// tables never interleave a read-decide-write for one id.
pub fn merge_users_chats<S>(
    source: &S,
    users: &Mutex<HashMap<i64, User>>,
    chats: &Mutex<HashMap<i64, Chat>>,
) where
    S: PeerSource + ?Sized,
{
    {
        let mut users = lock(users);
        for user in source.users().values() {
            let existing = users.get(&user.id).map(|prev| prev.min);
            if should_store(user.min, existing) {
                users.insert(user.id, user.clone());
            } else {
                trace!("Keeping full user {} over min record", user.id);
            }
        }
    }

    let mut chats = lock(chats);
    for chat in source.chats().values() {
        let id = chat.id();
        let store = match chat {
            Chat::Channel(channel) => {
                let existing = chats.get(&id).and_then(Chat::as_channel).map(|prev| prev.min);
                should_store(channel.min, existing)
            }
            Chat::Group(_) => true,
        };
        if store {
            chats.insert(id, chat.clone());
        } else {
            trace!("Keeping full channel {} over min record", id);
        }
    }
}

/// A users table and a chats table filled from many batches.
#[derive(Debug, Default)]
pub struct PeerCache {
    users: Mutex<HashMap<i64, User>>,
    chats: Mutex<HashMap<i64, Chat>>,
}

impl PeerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collect<S: PeerSource + ?Sized>(&self, source: &S) {
        merge_users_chats(source, &self.users, &self.chats);
        debug!(
            "Collected {} users and {} chats",
            source.users().len(),
            source.chats().len()
        );
    }

    pub fn user(&self, id: i64) -> Option<User> {
        lock(&self.users).get(&id).cloned()
    }

    pub fn chat(&self, id: i64) -> Option<Chat> {
        lock(&self.chats).get(&id).cloned()
    }

    /// Snapshot of the users table.
    pub fn users(&self) -> HashMap<i64, User> {
        lock(&self.users).clone()
    }

    /// Snapshot of the chats table.
    pub fn chats(&self) -> HashMap<i64, Chat> {
        lock(&self.chats).clone()
    }

    /// Access hashes of every stored user that has one.
    pub fn access_hashes(&self) -> HashMap<i64, i64> {
        lock(&self.users)
            .values()
            .filter_map(|u| u.access_hash.map(|hash| (u.id, hash)))
            .collect()
    }

    /// Snapshot of both tables as a batch.
    pub fn snapshot(&self) -> PeerBatch {
        PeerBatch {
            users: self.users(),
            chats: self.chats(),
        }
    }
}
