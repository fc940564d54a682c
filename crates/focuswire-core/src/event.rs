use serde::Deserialize;

/// A single active-window change as reported by the host environment.
///
/// The event is transient: it is produced by a watcher, projected onto the
/// configured call arguments and forgotten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowEvent {
    /// "instance.class" identity of the owning application.
    pub app_id: String,
    /// Window title.
    pub caption: String,
    /// Numeric window id assigned by the host.
    pub window_id: u64,
}

impl WindowEvent {
    pub fn new(app_id: impl Into<String>, caption: impl Into<String>, window_id: u64) -> Self {
        Self {
            app_id: app_id.into(),
            caption: caption.into(),
            window_id,
        }
    }

    /// Project the event onto the configured field list, in configuration
    /// order. An empty list falls back to the default projection so a call
    /// always carries at least one argument.
    pub fn call_args(&self, fields: &[Field]) -> CallArgs {
        let mut values = fields.iter().map(|field| self.field_value(*field));

        match (values.next(), values.next(), values.next()) {
            (Some(a), None, _) => CallArgs::One(a),
            (Some(a), Some(b), None) => CallArgs::Two(a, b),
            (Some(a), Some(b), Some(c)) => CallArgs::Three(a, b, c),
            (None, ..) => CallArgs::Two(
                self.field_value(Field::AppId),
                self.field_value(Field::WindowId),
            ),
        }
    }

    fn field_value(&self, field: Field) -> String {
        match field {
            Field::AppId => self.app_id.clone(),
            Field::Caption => self.caption.clone(),
            // the listener receives the id as a decimal string
            Field::WindowId => self.window_id.to_string(),
        }
    }
}

/// One forwardable piece of window metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Field {
    AppId,
    Caption,
    WindowId,
}

/// Ordered argument list of one bus call. Arity is bounded by the three
/// available fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArgs {
    One(String),
    Two(String, String),
    Three(String, String, String),
}

impl CallArgs {
    pub fn len(&self) -> usize {
        match self {
            CallArgs::One(_) => 1,
            CallArgs::Two(..) => 2,
            CallArgs::Three(..) => 3,
        }
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Join the WM_CLASS-style instance and class parts into the
/// "instance.class" identity the listener expects.
pub fn compose_app_id(instance: &str, class: &str) -> String {
    match (instance.is_empty(), class.is_empty()) {
        (false, false) => format!("{}.{}", instance, class),
        (false, true) => instance.to_string(),
        (true, false) => class.to_string(),
        (true, true) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> WindowEvent {
        WindowEvent::new("navigator.Firefox", "Rust - Mozilla Firefox", 69206020)
    }

    #[test]
    fn compose_app_id_joins_instance_and_class() {
        assert_eq!(compose_app_id("navigator", "Firefox"), "navigator.Firefox");
    }

    #[test]
    fn compose_app_id_handles_missing_parts() {
        assert_eq!(compose_app_id("", "Firefox"), "Firefox");
        assert_eq!(compose_app_id("navigator", ""), "navigator");
        assert_eq!(compose_app_id("", ""), "");
    }

    #[test]
    fn call_args_follow_configuration_order() {
        let event = sample_event();

        let args = event.call_args(&[Field::Caption, Field::AppId]);

        assert_eq!(
            args,
            CallArgs::Two(
                "Rust - Mozilla Firefox".to_string(),
                "navigator.Firefox".to_string()
            )
        );
    }

    #[test]
    fn call_args_stringify_the_window_id() {
        let event = sample_event();

        let args = event.call_args(&[Field::WindowId]);

        assert_eq!(args, CallArgs::One("69206020".to_string()));
    }

    #[test]
    fn call_args_support_all_three_fields() {
        let event = sample_event();

        let args = event.call_args(&[Field::AppId, Field::Caption, Field::WindowId]);

        assert_eq!(
            args,
            CallArgs::Three(
                "navigator.Firefox".to_string(),
                "Rust - Mozilla Firefox".to_string(),
                "69206020".to_string()
            )
        );
    }

    #[test]
    fn empty_projection_falls_back_to_default() {
        let event = sample_event();

        let args = event.call_args(&[]);

        assert_eq!(
            args,
            CallArgs::Two("navigator.Firefox".to_string(), "69206020".to_string())
        );
    }

    #[test]
    fn empty_caption_is_forwarded_not_skipped() {
        let event = WindowEvent::new("kitty.kitty", "", 42);

        let args = event.call_args(&[Field::Caption, Field::WindowId]);

        assert_eq!(args, CallArgs::Two(String::new(), "42".to_string()));
    }

    #[test]
    fn call_args_report_their_arity() {
        let event = sample_event();

        assert_eq!(event.call_args(&[Field::AppId]).len(), 1);
        assert_eq!(event.call_args(&[]).len(), 2);
        assert!(!event.call_args(&[]).is_empty());
    }
}
