//! CSV export of an accumulated session.
//!
//! Layout: a two-column metadata block, a blank separator row, then the
//! fixed twelve-column header and one row per record in accumulation order.

use std::io::Write;

use chrono::NaiveDate;
use csv::WriterBuilder;
use revex_core::{ProductInfo, ReviewRecord};

use crate::error::ExtractError;

const HEADERS: [&str; 12] = [
    "Review ID",
    "Reviewer Name",
    "Rating",
    "Title",
    "Date",
    "Country",
    "Text",
    "Verified Purchase",
    "Helpful Votes",
    "Images",
    "Location",
    "Variant",
];

/// Writes the metadata block, header, and one row per record to `writer`.
///
/// # Errors
///
/// Returns [`ExtractError::Csv`] when a record cannot be serialized and
/// [`ExtractError::Io`] when the underlying writer fails.
pub fn write_csv<W: Write>(
    writer: W,
    product: &ProductInfo,
    reviews: &[ReviewRecord],
    pages_extracted: usize,
) -> Result<(), ExtractError> {
    // Metadata rows are two columns wide, data rows twelve.
    let mut csv = WriterBuilder::new().flexible(true).from_writer(writer);

    csv.write_record(["Product Title", product.title.as_str()])?;
    csv.write_record(["Product ID", product.product_id.as_str()])?;
    csv.write_record(["URL", product.url.as_str()])?;
    csv.write_record(["Extracted At", product.extracted_at.as_str()])?;
    csv.write_record(["Total Reviews", reviews.len().to_string().as_str()])?;
    csv.write_record(["Pages Extracted", pages_extracted.to_string().as_str()])?;
    csv.write_record(["", ""])?;

    csv.write_record(HEADERS)?;
    for review in reviews {
        csv.write_record(record_fields(review))?;
    }
    csv.flush()?;
    Ok(())
}

fn record_fields(review: &ReviewRecord) -> [String; 12] {
    [
        review.id.clone(),
        review.reviewer_name.clone(),
        review.rating.map(|r| r.to_string()).unwrap_or_default(),
        review.title.clone(),
        review.date.clone(),
        review.country.clone(),
        review.text.clone(),
        review
            .verified_purchase
            .map(|verified| if verified { "Yes" } else { "No" }.to_string())
            .unwrap_or_default(),
        review
            .helpful_votes
            .map(|votes| votes.to_string())
            .unwrap_or_default(),
        review
            .images
            .as_ref()
            .map(|images| images.join("; "))
            .unwrap_or_default(),
        review.location.clone(),
        review.variant.clone(),
    ]
}

/// File name for an export on `date`: every non-alphanumeric character of
/// the product title becomes an underscore.
#[must_use]
pub fn export_filename(product: &ProductInfo, date: NaiveDate) -> String {
    let title: String = product
        .title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("reviews_{title}_{}.csv", date.format("%Y-%m-%d"))
}
