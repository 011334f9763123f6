use domain::transcript::{Bubble, Transcript};

/// Drawing surface for a chat widget.
///
/// The widget calls `content_changed` after every batch of mutations; views
/// that scroll should jump to the bottom there. Calls may repeat.
pub trait ChatView {
    fn bubble_appended(&mut self, bubble: &Bubble);
    fn bubble_removed(&mut self, bubble: &Bubble);
    fn timestamp_attached(&mut self, bubble: &Bubble);
    fn content_changed(&mut self, transcript: &Transcript);
}

/// View that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl ChatView for NullView {
    fn bubble_appended(&mut self, _bubble: &Bubble) {}
    fn bubble_removed(&mut self, _bubble: &Bubble) {}
    fn timestamp_attached(&mut self, _bubble: &Bubble) {}
    fn content_changed(&mut self, _transcript: &Transcript) {}
}
