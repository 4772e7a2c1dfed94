/// What a component did with a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed, nothing for the view to do
  Handled,
  /// Consumed, and the view should react to this event
  Event(T),
  /// Not consumed; the view tries its own bindings
  NotHandled,
}
