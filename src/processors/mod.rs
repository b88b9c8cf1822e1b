pub mod georeferencer;
pub mod instant_builder;
pub mod palette_decoder;
pub mod pipeline;
pub mod run_report;
pub mod temporal_aggregator;

pub use georeferencer::{ClipWindow, Georeferencer, RegionOfInterest};
pub use instant_builder::InstantBuilder;
pub use palette_decoder::{ColorMetric, NoDataBand, PaletteDecoder};
pub use pipeline::Pipeline;
pub use run_report::{IncompletePeriod, PeriodFailure, RunReport};
pub use temporal_aggregator::{
    plan_periods, reduce_with_validity_mask, PeriodPlan, PeriodState, TemporalAggregator,
};
