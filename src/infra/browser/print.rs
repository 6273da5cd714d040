use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;

use crate::domain::pdf::PdfLayout;

/// CDP print parameters for a resolved layout.
pub(crate) fn print_params(layout: &PdfLayout) -> PrintToPdfParams {
    PrintToPdfParams {
        landscape: Some(layout.landscape),
        display_header_footer: Some(layout.display_header_footer),
        print_background: Some(layout.print_background),
        scale: Some(layout.scale),
        paper_width: Some(layout.paper_width),
        paper_height: Some(layout.paper_height),
        margin_top: Some(layout.margin_top),
        margin_bottom: Some(layout.margin_bottom),
        margin_left: Some(layout.margin_left),
        margin_right: Some(layout.margin_right),
        page_ranges: layout.page_ranges.clone(),
        header_template: layout.header_template.clone(),
        footer_template: layout.footer_template.clone(),
        prefer_css_page_size: Some(layout.prefer_css_page_size),
        ..Default::default()
    }
}
