mod controller;
mod render;
mod state;

pub use controller::ChartController;
pub use render::{
    legend, tick_label, tooltip_label, AreaChart, ChartSeries, Layer, LegendItem, Tick, Tooltip,
    TooltipEntry, HEIGHT, SERIES, WIDTH,
};
pub use state::{Action, ChartState, ChartView, Effect, FetchRequest, Ticket, Viewport};
