//! Named event dispatch.
//!
//! Handlers are registered under an (event group, name) pair once at
//! startup. Raising a name nobody registered is a normal outcome that
//! callers use to fall back to default behaviour.

use std::collections::HashMap;

use crate::error::CommandError;
use crate::tree::command::CommandContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventGroup {
    TreeView,
    Core,
}

/// Value a handler may leave for the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EventReturn {
    #[default]
    None,
    Bool(bool),
    Text(String),
}

pub type Handler =
    fn(&EventBus, &mut CommandContext<'_>, &mut EventReturn) -> Result<(), CommandError>;

/// Outcome of [`EventBus::raise`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// No handler is registered under the name.
    NotHandled,
    /// Every handler ran to completion.
    Handled,
    /// A handler ran and reported a failure; later handlers were skipped.
    Failed(CommandError),
}

impl Dispatch {
    /// Whether any handler ran, successful or not.
    pub fn handled(&self) -> bool {
        !matches!(self, Self::NotHandled)
    }

    pub fn error(&self) -> Option<&CommandError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn into_result(self) -> Result<bool, CommandError> {
        match self {
            Self::NotHandled => Ok(false),
            Self::Handled => Ok(true),
            Self::Failed(err) => Err(err),
        }
    }
}

#[derive(Default)]
pub struct EventBus {
    table: HashMap<EventGroup, HashMap<&'static str, Vec<Handler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the list for (`group`, `name`).
    pub fn register(&mut self, group: EventGroup, name: &'static str, handler: Handler) {
        tracing::debug!(?group, name, "registering event handler");
        self.table
            .entry(group)
            .or_default()
            .entry(name)
            .or_default()
            .push(handler);
    }

    pub fn register_group(&mut self, group: EventGroup, handlers: &[(&'static str, Handler)]) {
        for (name, handler) in handlers {
            self.register(group, name, *handler);
        }
    }

    pub fn is_registered(&self, group: EventGroup, name: &str) -> bool {
        self.table
            .get(&group)
            .and_then(|names| names.get(name))
            .is_some_and(|handlers| !handlers.is_empty())
    }

    /// Run every handler registered under (`group`, `name`) in order.
    pub fn raise(
        &self,
        group: EventGroup,
        name: &str,
        ctx: &mut CommandContext<'_>,
        ret: &mut EventReturn,
    ) -> Dispatch {
        let Some(handlers) = self.table.get(&group).and_then(|names| names.get(name)) else {
            tracing::trace!(?group, name, "no handler for event");
            return Dispatch::NotHandled;
        };
        for handler in handlers {
            if let Err(err) = handler(self, ctx, ret) {
                tracing::warn!(?group, name, error = %err, "event handler failed");
                return Dispatch::Failed(err);
            }
        }
        Dispatch::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::store::tests::store_with;
    use crate::tree::command::tests::RecordingHost;
    use crate::tree::command::EventData;
    use crate::tree::view::tests::view_over;
    use crate::tree::NavigationMode;

    fn set_true(
        _: &EventBus,
        _: &mut CommandContext<'_>,
        ret: &mut EventReturn,
    ) -> Result<(), CommandError> {
        *ret = EventReturn::Bool(true);
        Ok(())
    }

    fn append_text(
        _: &EventBus,
        _: &mut CommandContext<'_>,
        ret: &mut EventReturn,
    ) -> Result<(), CommandError> {
        let mut text = match ret {
            EventReturn::Text(t) => t.clone(),
            _ => String::new(),
        };
        text.push('x');
        *ret = EventReturn::Text(text);
        Ok(())
    }

    fn fail(
        _: &EventBus,
        _: &mut CommandContext<'_>,
        _: &mut EventReturn,
    ) -> Result<(), CommandError> {
        Err(CommandError::new("test", "boom"))
    }

    fn raise_on_fresh_view(bus: &EventBus, group: EventGroup, name: &str) -> (Dispatch, EventReturn) {
        let store = store_with(&["/"]).into_handle();
        let mut view = view_over(&store, NavigationMode::Flat, 10);
        let mut host = RecordingHost::default();
        let mut ctx = CommandContext::new(&mut view, &mut host, EventData::None);
        let mut ret = EventReturn::None;
        let dispatch = bus.raise(group, name, &mut ctx, &mut ret);
        (dispatch, ret)
    }

    #[test]
    fn unknown_name_is_not_handled() {
        let bus = EventBus::new();
        let (dispatch, ret) = raise_on_fresh_view(&bus, EventGroup::TreeView, "nothing");
        assert_eq!(dispatch, Dispatch::NotHandled);
        assert!(!dispatch.handled());
        assert_eq!(ret, EventReturn::None);
    }

    #[test]
    fn groups_are_separate() {
        let mut bus = EventBus::new();
        bus.register(EventGroup::Core, "help", set_true);
        assert!(bus.is_registered(EventGroup::Core, "help"));
        assert!(!bus.is_registered(EventGroup::TreeView, "help"));
        let (dispatch, _) = raise_on_fresh_view(&bus, EventGroup::TreeView, "help");
        assert_eq!(dispatch, Dispatch::NotHandled);
    }

    #[test]
    fn handler_fills_return_slot() {
        let mut bus = EventBus::new();
        bus.register(EventGroup::TreeView, "probe", set_true);
        let (dispatch, ret) = raise_on_fresh_view(&bus, EventGroup::TreeView, "probe");
        assert_eq!(dispatch, Dispatch::Handled);
        assert_eq!(ret, EventReturn::Bool(true));
    }

    #[test]
    fn duplicate_names_run_in_registration_order() {
        let mut bus = EventBus::new();
        bus.register_group(
            EventGroup::TreeView,
            &[("twice", append_text as Handler), ("twice", append_text)],
        );
        let (_, ret) = raise_on_fresh_view(&bus, EventGroup::TreeView, "twice");
        assert_eq!(ret, EventReturn::Text("xx".into()));
    }

    #[test]
    fn failure_still_counts_as_handled() {
        let mut bus = EventBus::new();
        bus.register(EventGroup::TreeView, "broken", fail);
        bus.register(EventGroup::TreeView, "broken", set_true);
        let (dispatch, ret) = raise_on_fresh_view(&bus, EventGroup::TreeView, "broken");
        assert!(dispatch.handled());
        assert_eq!(dispatch.error().map(|e| e.message.as_str()), Some("boom"));
        assert_eq!(ret, EventReturn::None);
        assert!(dispatch.into_result().is_err());
    }
}
