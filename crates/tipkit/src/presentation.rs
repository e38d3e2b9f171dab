//! Presentation records handed to the rendering layer.
//!
//! The engine fills these in and passes them through; placement math and
//! drawing belong to the renderer.

use crate::tip::{RenderedTip, Tip};

/// Anchor position in root coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
  pub x: f32,
  pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
  pub width:  u32,
  pub height: u32,
}

/// Where a popup sits relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
  TopStart,
  TopCenter,
  TopEnd,
  CenterStart,
  Center,
  CenterEnd,
  BottomStart,
  #[default]
  BottomCenter,
  BottomEnd,
}

/// Gap between anchor and popup, in density-independent units.
pub const DEFAULT_PADDING: f32 = 8.0;

/// A tip drawn in a popup next to its anchor.
pub struct PopupPresentation<S> {
  pub tip:             Tip<S>,
  pub content:         RenderedTip,
  pub anchor_position: Offset,
  pub anchor_size:     Size,
  pub alignment:       Alignment,
  pub padding:         f32,
}

impl<S> PopupPresentation<S> {
  /// A popup for `tip` with its content rendered now and default placement.
  pub fn new(tip: Tip<S>) -> Self {
    let content = tip.render();
    Self {
      tip,
      content,
      anchor_position: Offset::default(),
      anchor_size: Size::default(),
      alignment: Alignment::default(),
      padding: DEFAULT_PADDING,
    }
  }

  pub fn anchored(mut self, position: Offset, size: Size) -> Self {
    self.anchor_position = position;
    self.anchor_size = size;
    self
  }

  pub fn aligned(mut self, alignment: Alignment) -> Self {
    self.alignment = alignment;
    self
  }

  pub fn padded(mut self, padding: f32) -> Self {
    self.padding = padding;
    self
  }
}

impl<S> Clone for PopupPresentation<S> {
  fn clone(&self) -> Self {
    Self {
      tip:             self.tip.clone(),
      content:         self.content.clone(),
      anchor_position: self.anchor_position,
      anchor_size:     self.anchor_size,
      alignment:       self.alignment,
      padding:         self.padding,
    }
  }
}

/// A tip drawn in place, inside the screen content.
pub struct InlinePresentation<S> {
  pub tip:     Tip<S>,
  pub content: RenderedTip,
}

impl<S> InlinePresentation<S> {
  pub fn new(tip: Tip<S>) -> Self {
    let content = tip.render();
    Self { tip, content }
  }
}

impl<S> Clone for InlinePresentation<S> {
  fn clone(&self) -> Self {
    Self { tip: self.tip.clone(), content: self.content.clone() }
  }
}

pub enum TipPresentation<S> {
  Popup(PopupPresentation<S>),
  Inline(InlinePresentation<S>),
}

impl<S> TipPresentation<S> {
  pub fn tip(&self) -> &Tip<S> {
    match self {
      Self::Popup(p) => &p.tip,
      Self::Inline(i) => &i.tip,
    }
  }

  pub fn content(&self) -> &RenderedTip {
    match self {
      Self::Popup(p) => &p.content,
      Self::Inline(i) => &i.content,
    }
  }
}

impl<S> Clone for TipPresentation<S> {
  fn clone(&self) -> Self {
    match self {
      Self::Popup(p) => Self::Popup(p.clone()),
      Self::Inline(i) => Self::Inline(i.clone()),
    }
  }
}

impl<S> std::fmt::Debug for TipPresentation<S> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let kind = match self {
      Self::Popup(_) => "Popup",
      Self::Inline(_) => "Inline",
    };
    f.debug_struct(kind)
      .field("tip", &self.tip().name())
      .field("content", self.content())
      .finish_non_exhaustive()
  }
}

impl<S> From<PopupPresentation<S>> for TipPresentation<S> {
  fn from(p: PopupPresentation<S>) -> Self { Self::Popup(p) }
}

impl<S> From<InlinePresentation<S>> for TipPresentation<S> {
  fn from(i: InlinePresentation<S>) -> Self { Self::Inline(i) }
}
