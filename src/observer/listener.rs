//! Listener capability and options

use std::sync::{Arc, Weak};

/// Something that can receive updated values
///
/// Any `Fn(&V)` closure is notifiable. [`TargetAction`] binds a method of a
/// shared object instead.
pub trait Notifiable<V>: Send + Sync {
    /// Receive an updated value
    fn notify(&self, value: &V);

    /// Human-readable name used for descriptive listener ids
    fn describe(&self) -> Option<String> {
        None
    }
}

impl<V, F> Notifiable<V> for F
where
    F: Fn(&V) + Send + Sync,
{
    fn notify(&self, value: &V) {
        self(value)
    }
}

/// A method bound to a weakly-held target
///
/// The listener does not keep the target alive; once the target is dropped
/// notifications are ignored.
pub struct TargetAction<T, V> {
    target: Weak<T>,
    action: fn(&T, &V),
    action_name: String,
}

impl<T, V> TargetAction<T, V> {
    /// Bind `action` (named `action_name`) to `target`
    pub fn new(target: &Arc<T>, action_name: impl Into<String>, action: fn(&T, &V)) -> Self {
        Self {
            target: Arc::downgrade(target),
            action,
            action_name: action_name.into(),
        }
    }

    /// Whether the target is still alive
    pub fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }
}

impl<T, V> Notifiable<V> for TargetAction<T, V>
where
    T: Send + Sync,
{
    fn notify(&self, value: &V) {
        match self.target.upgrade() {
            Some(target) => (self.action)(&target, value),
            None => tracing::trace!(action = %self.action_name, "Listener target dropped"),
        }
    }

    fn describe(&self) -> Option<String> {
        Some(format!("{}_{}", short_type_name::<T>(), self.action_name))
    }
}

/// Last path segment of a type name, without generics
fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Options for adding a listener
#[derive(Debug, Clone)]
pub struct ListenerOptions {
    /// Caller-chosen local id (allocated when None)
    pub id: Option<String>,
    /// Prefix the id with the data source key
    pub namespacing: bool,
    /// Replace an existing listener with the same id
    pub overwrite: bool,
}

impl Default for ListenerOptions {
    fn default() -> Self {
        Self {
            id: None,
            namespacing: true,
            overwrite: true,
        }
    }
}

impl ListenerOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the local id
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Enable or disable namespacing
    pub fn namespacing(mut self, enabled: bool) -> Self {
        self.namespacing = enabled;
        self
    }

    /// Enable or disable overwriting
    pub fn overwrite(mut self, enabled: bool) -> Self {
        self.overwrite = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct InboxView {
        seen: Mutex<Vec<u32>>,
    }

    impl InboxView {
        fn update_count(&self, count: &u32) {
            self.seen.lock().unwrap().push(*count);
        }
    }

    #[test]
    fn test_target_action_delivers_to_target() {
        let view = Arc::new(InboxView {
            seen: Mutex::new(Vec::new()),
        });
        let listener = TargetAction::new(&view, "update_count", InboxView::update_count);

        listener.notify(&3);
        listener.notify(&4);
        assert_eq!(*view.seen.lock().unwrap(), vec![3, 4]);
    }

    #[test]
    fn test_target_action_describes_itself() {
        let view = Arc::new(InboxView {
            seen: Mutex::new(Vec::new()),
        });
        let listener = TargetAction::new(&view, "update_count", InboxView::update_count);

        assert_eq!(
            Notifiable::<u32>::describe(&listener).as_deref(),
            Some("InboxView_update_count")
        );
    }

    #[test]
    fn test_target_action_ignores_dropped_target() {
        let view = Arc::new(InboxView {
            seen: Mutex::new(Vec::new()),
        });
        let listener = TargetAction::new(&view, "update_count", InboxView::update_count);
        drop(view);

        assert!(!listener.is_alive());
        listener.notify(&1);
    }

    #[test]
    fn test_closures_have_no_description() {
        let listener = |_: &u32| {};

        assert!(Notifiable::<u32>::describe(&listener).is_none());
    }

    #[test]
    fn test_options_builder() {
        let options = ListenerOptions::new().id("x").namespacing(false).overwrite(false);

        assert_eq!(options.id.as_deref(), Some("x"));
        assert!(!options.namespacing);
        assert!(!options.overwrite);

        let defaults = ListenerOptions::default();
        assert!(defaults.id.is_none() && defaults.namespacing && defaults.overwrite);
    }
}
