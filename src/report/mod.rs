mod markdown;
mod naming;

pub use markdown::{
    render_generation_markdown, render_listing_markdown, render_verify_markdown, write_report,
    ListingTableRow, HUMAN_TIME_FORMAT,
};
pub use naming::ReportNaming;
