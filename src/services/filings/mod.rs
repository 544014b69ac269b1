pub mod capital_gains;
pub mod dividends;
pub mod interest;
pub mod xml;

use rust_decimal::Decimal;

use self::xml::Element;
use crate::services::shared::env::FilerIdentity;

pub const NS_EDP: &str = "http://edavki.durs.si/Documents/Schemas/EDP-Common-1.xsd";
pub const NS_KDVP: &str = "http://edavki.durs.si/Documents/Schemas/Doh_KDVP_9.xsd";
pub const NS_DIV: &str = "http://edavki.durs.si/Documents/Schemas/Doh_Div_3.xsd";
pub const NS_OBR: &str = "http://edavki.durs.si/Documents/Schemas/Doh_Obr_2.xsd";

/// One generated filing document plus the summary numbers shown after a run.
pub struct Filing {
    pub name: &'static str,
    pub file_name: &'static str,
    pub envelope: Element,
    pub record_count: usize,
    pub total_eur: Decimal,
}

/// Shared eDavki envelope: taxpayer header, workflow marker for an original
/// (non-corrective) submission, and the empty signature block the portal
/// fills in on upload.
pub fn envelope(default_ns: &str, filer: &FilerIdentity) -> Element {
    let mut root = Element::new("Envelope")
        .attr("xmlns", default_ns)
        .attr("xmlns:edp", NS_EDP);

    let header = root.push("edp:Header");
    let taxpayer = header.push("edp:taxpayer");
    taxpayer.push_text("edp:taxNumber", &filer.tax_number);
    taxpayer.push_text("edp:taxpayerType", &filer.taxpayer_type);
    taxpayer.push_text("edp:name", &filer.name);
    if !filer.address.is_empty() {
        taxpayer.push_text("edp:address1", &filer.address);
    }
    if !filer.city.is_empty() {
        taxpayer.push_text("edp:city", &filer.city);
    }
    if !filer.post_number.is_empty() {
        taxpayer.push_text("edp:postNumber", &filer.post_number);
    }
    if !filer.post_name.is_empty() {
        taxpayer.push_text("edp:postName", &filer.post_name);
    }
    let workflow = header.push("edp:Workflow");
    workflow.push_text("edp:DocumentWorkflowID", "O");

    root.push("edp:AttachmentList");
    root.push("edp:Signatures");

    root
}

pub fn format_decimal(value: Decimal, decimal_places: u32) -> String {
    format!(
        "{:.prec$}",
        value.round_dp(decimal_places),
        prec = decimal_places as usize
    )
}

/// What to do with a monetary field that rounds to zero at its precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroPolicy {
    /// Write the zero out, e.g. "0.00" for a default foreign tax.
    Emit,
    /// Leave the element off but keep the record.
    Omit,
    /// Signal the caller to drop the whole record.
    SkipRecord,
}

/// Appends a formatted monetary leaf according to the zero policy. Returns
/// false only when the record itself must be dropped.
pub fn push_decimal(
    parent: &mut Element,
    tag: &str,
    value: Decimal,
    decimal_places: u32,
    policy: ZeroPolicy,
) -> bool {
    if value.round_dp(decimal_places) == Decimal::ZERO {
        match policy {
            ZeroPolicy::Emit => {
                parent.push_text(tag, format_decimal(Decimal::ZERO, decimal_places));
                return true;
            }
            ZeroPolicy::Omit => return true,
            ZeroPolicy::SkipRecord => return false,
        }
    }
    parent.push_text(tag, format_decimal(value, decimal_places));
    true
}
