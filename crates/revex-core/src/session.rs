//! Persistable extraction session state.
//!
//! Two shapes exist on purpose. [`SessionState`] is the full working state of
//! the page-side extraction (every accumulated review), written to durable
//! storage after every page so an in-page navigation that destroys the
//! execution context loses nothing. [`SessionSummary`] is the lightweight
//! mirror a coordinating process keeps for status queries and UI restoration;
//! it never carries review bodies.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::records::{ProductInfo, ReviewRecord};

/// Operator-selected extraction options.
///
/// Optional fields on [`ReviewRecord`] stay `None` unless the matching flag
/// is set, keeping exports narrow by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSettings {
    /// Collect attached image URLs.
    #[serde(default)]
    pub include_images: bool,
    /// Collect helpful-vote counts.
    #[serde(default)]
    pub include_helpful: bool,
    /// Collect the verified-purchase badge.
    #[serde(default)]
    pub include_verified: bool,
}

/// Full working state of one extraction run.
///
/// Mutations happen in memory and are flushed to the state store by the
/// coordinator immediately afterwards; this struct itself does no I/O.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Whether a run is currently active. Drives resume detection.
    pub is_extracting: bool,

    /// Accumulated reviews in extraction order. No two entries share an id.
    pub reviews: Vec<ReviewRecord>,

    /// 1-based page the run last worked on.
    pub current_page: u32,

    /// Options the run was started with.
    pub settings: ExtractionSettings,

    /// Product metadata captured at run start. `None` until the first page
    /// has been read.
    pub product: Option<ProductInfo>,

    /// Pages whose reviews have already been accumulated.
    pub extracted_pages: BTreeSet<u32>,
}

impl SessionState {
    /// State for a freshly started run.
    #[must_use]
    pub fn started(settings: ExtractionSettings) -> Self {
        Self {
            is_extracting: true,
            current_page: 1,
            settings,
            ..Self::default()
        }
    }

    /// Whether `page` has already been extracted in this run.
    #[must_use]
    pub fn has_extracted(&self, page: u32) -> bool {
        self.extracted_pages.contains(&page)
    }

    /// Merges freshly extracted reviews into the accumulation, dropping any
    /// whose id is already present. Returns how many were actually added.
    ///
    /// This is the single place the id-uniqueness invariant is enforced; it
    /// absorbs double extraction of a page after an interrupted navigation
    /// or a resume overlap.
    pub fn absorb_reviews(&mut self, found: Vec<ReviewRecord>) -> usize {
        let mut known: HashSet<String> = self.reviews.iter().map(|r| r.id.clone()).collect();
        let mut added = 0usize;
        for record in found {
            if known.insert(record.id.clone()) {
                self.reviews.push(record);
                added += 1;
            }
        }
        added
    }

    /// Marks `page` extracted and records it as the current page.
    pub fn mark_extracted(&mut self, page: u32) {
        self.extracted_pages.insert(page);
        self.current_page = page;
    }
}

/// Coordinating-process mirror of an active run.
///
/// Restorable without touching the page context, so a status surface can
/// show progress even while the page is mid-navigation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub is_extracting: bool,
    pub total_reviews: u32,
    pub total_pages: u32,
    pub current_page: u32,
    pub product_title: String,
    pub settings: Option<ExtractionSettings>,
}
