//! Last-seen object store for one watch stream
//!
//! A watch only reports the new state of an object. The tracker remembers
//! the previous state so updates can carry both.
//!
//! ```text
//! Init ─► InitApply* ─► InitDone      seed silently, replace store at InitDone
//! Apply(unseen)                       Created
//! Apply(seen)                         Updated { previous }
//! Delete                              Deleted, forget
//! ```

use crate::event::{ChangeReason, Event, ResourceObject};
use kube::runtime::watcher;
use kube::{Resource, ResourceExt};
use std::collections::HashMap;

/// Tracks objects of one resource type
pub struct ChangeTracker<K> {
    known: HashMap<String, K>,
    /// Objects collected during an in-progress (re)list
    relist: Option<HashMap<String, K>>,
}

impl<K> ChangeTracker<K>
where
    K: Resource<DynamicType = ()> + Clone,
    ResourceObject: From<K>,
{
    pub fn new() -> Self {
        Self {
            known: HashMap::new(),
            relist: None,
        }
    }

    /// Number of objects currently known
    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Turn a watch notification into a change event
    ///
    /// Listing phases produce nothing; objects that existed before the
    /// watch started are not reported as created.
    pub fn handle(&mut self, notification: watcher::Event<K>) -> Option<Event> {
        match notification {
            watcher::Event::Init => {
                self.relist = Some(HashMap::new());
                None
            }
            watcher::Event::InitApply(obj) => {
                self.relist
                    .get_or_insert_with(HashMap::new)
                    .insert(object_key(&obj), obj);
                None
            }
            watcher::Event::InitDone => {
                if let Some(listed) = self.relist.take() {
                    self.known = listed;
                }
                None
            }
            watcher::Event::Apply(obj) => Some(self.apply(obj)),
            watcher::Event::Delete(obj) => Some(self.delete(obj)),
        }
    }

    fn apply(&mut self, obj: K) -> Event {
        match self.known.insert(object_key(&obj), obj.clone()) {
            Some(previous) => to_event(ChangeReason::Updated, obj).with_previous(previous),
            None => to_event(ChangeReason::Created, obj),
        }
    }

    fn delete(&mut self, obj: K) -> Event {
        self.known.remove(&object_key(&obj));
        to_event(ChangeReason::Deleted, obj)
    }
}

impl<K> Default for ChangeTracker<K>
where
    K: Resource<DynamicType = ()> + Clone,
    ResourceObject: From<K>,
{
    fn default() -> Self {
        Self::new()
    }
}

fn to_event<K>(reason: ChangeReason, obj: K) -> Event
where
    K: Resource<DynamicType = ()>,
    ResourceObject: From<K>,
{
    Event::new(K::kind(&()), reason, obj)
}

/// UID, or `namespace/name` for objects without one
fn object_key<K: Resource>(obj: &K) -> String {
    obj.uid().unwrap_or_else(|| {
        format!(
            "{}/{}",
            obj.namespace().unwrap_or_default(),
            obj.name_any()
        )
    })
}
