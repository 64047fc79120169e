//! Core engine for the reflectance spectra viewer.
//!
//! Holds everything that does not touch pixels or widgets directly: the
//! interpolation helpers, the per-sample series store, the nearest-point
//! hit-test, the view-window synchronization engine and the calc-foci
//! measurement state machine. A front end drives it through
//! [`state::ViewState`] and receives drawing work through the
//! [`surface::RenderSurface`] trait.

pub mod calc;
pub mod color;
pub mod error;
pub mod hit_test;
pub mod interp;
pub mod inventory;
pub mod scale;
pub mod series;
pub mod state;
pub mod surface;
pub mod window;

pub use calc::{CalcFoci, CalcMode, CalcResult, CalcState, CalcSummary, ClickOutcome, Focus, SummaryValue};
pub use color::{ColorAllocator, LineColor};
pub use error::{CurveError, WindowError};
pub use hit_test::Hit;
pub use interp::Point;
pub use scale::{Scale, ZoomTransform};
pub use inventory::{Inventory, MemoryInventory};
pub use series::{
    Curve, LayerVisibility, Normalization, Sample, SampleId, SeriesKey, SeriesStore, Variant,
};
pub use state::{Toggles, ViewState};
pub use surface::{Axis, CurveStyle, MarkerKind, RenderCommand, RenderSurface};
pub use window::{DataBounds, UpdateSource, ViewSync, ViewWindow, Widget};
