//! Section aligner.
//!
//! Every variant is aligned against one reference variant. Sections are
//! paired by slug first; leftovers are paired by title edit distance.
//! Whatever stays unpaired, and every pair that moved or changed level,
//! becomes a `structural_drift` finding located in the variant.

use std::collections::HashMap;

use rapidfuzz::distance::levenshtein;
use tracing::{debug, warn};

use crate::config::CheckConfig;
use crate::model::{Document, Section};
use crate::report::{DriftKind, Finding, Location, Severity};

struct Heading<'a> {
    section: &'a Section,
    key: String,
    /// Slug of the enclosing heading; empty at the top level.
    parent: &'a str,
    /// How many earlier headings share `parent` and slug.
    occurrence: usize,
}

impl<'a> Heading<'a> {
    fn collect(document: &'a Document) -> Vec<Self> {
        let mut open: Vec<&Section> = Vec::new();
        let mut seen: HashMap<(&str, &str), usize> = HashMap::new();
        let mut heads = Vec::new();
        for section in document.headed_sections() {
            while open.last().is_some_and(|s| s.depth >= section.depth) {
                open.pop();
            }
            let parent = open.last().copied().map_or("", |s| s.slug.as_str());
            let count = seen.entry((parent, section.slug.as_str())).or_default();
            heads.push(Self {
                section,
                key: normalize_title(&section.title),
                parent,
                occurrence: *count,
            });
            *count += 1;
            open.push(section);
        }
        heads
    }
}

/// Lowercase and collapse whitespace so fuzzy matching ignores casing and spacing.
fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pairing of reference headings to variant headings (indices into the
/// respective heading lists).
struct Pairing {
    to_variant: Vec<Option<usize>>,
    fuzzy_distance: Vec<Option<usize>>,
    variant_taken: Vec<bool>,
}

fn pair_headings(reference: &[Heading<'_>], variant: &[Heading<'_>], threshold: usize) -> Pairing {
    let mut to_variant = vec![None; reference.len()];
    let mut fuzzy_distance = vec![None; reference.len()];
    let mut variant_taken = vec![false; variant.len()];

    // Pass 1: same slug under the same parent. Deduplicated anchors
    // (`example`, `example-1`) shift when a sibling disappears, so they are
    // not compared directly.
    let by_place: HashMap<(&str, &str, usize), usize> = variant
        .iter()
        .enumerate()
        .map(|(vi, h)| ((h.parent, h.section.slug.as_str(), h.occurrence), vi))
        .collect();
    for (ri, head) in reference.iter().enumerate() {
        let place = (head.parent, head.section.slug.as_str(), head.occurrence);
        if let Some(&vi) = by_place.get(&place) {
            to_variant[ri] = Some(vi);
            variant_taken[vi] = true;
        }
    }

    // Pass 2: same slug anywhere, for sections moved under another parent.
    for (ri, head) in reference.iter().enumerate() {
        if to_variant[ri].is_some() {
            continue;
        }
        if let Some(vi) = (0..variant.len())
            .find(|&vi| !variant_taken[vi] && variant[vi].section.slug == head.section.slug)
        {
            to_variant[ri] = Some(vi);
            variant_taken[vi] = true;
        }
    }

    // Pass 3: title similarity for what is left. Lowest distance wins, ties
    // go to the earliest variant section.
    for (ri, head) in reference.iter().enumerate() {
        if to_variant[ri].is_some() {
            continue;
        }
        let best = variant
            .iter()
            .enumerate()
            .filter(|&(vi, _)| !variant_taken[vi])
            .map(|(vi, candidate)| {
                let distance = levenshtein::distance(head.key.chars(), candidate.key.chars());
                (distance, vi)
            })
            .filter(|&(distance, _)| distance < threshold)
            .min();
        if let Some((distance, vi)) = best {
            to_variant[ri] = Some(vi);
            fuzzy_distance[ri] = Some(distance);
            variant_taken[vi] = true;
        }
    }

    Pairing {
        to_variant,
        fuzzy_distance,
        variant_taken,
    }
}

/// Mark the members of one longest strictly increasing subsequence.
fn longest_increasing(values: &[usize]) -> Vec<bool> {
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; values.len()];
    for (i, &v) in values.iter().enumerate() {
        let pos = tails.partition_point(|&t| values[t] < v);
        if pos > 0 {
            prev[i] = Some(tails[pos - 1]);
        }
        if pos == tails.len() {
            tails.push(i);
        } else {
            tails[pos] = i;
        }
    }

    let mut keep = vec![false; values.len()];
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        keep[i] = true;
        cursor = prev[i];
    }
    keep
}

/// Pairs `(reference, variant)` outside the longest run that keeps
/// reference order.
fn out_of_order(to_variant: &[Option<usize>]) -> Vec<(usize, usize)> {
    let pairs: Vec<(usize, usize)> = to_variant
        .iter()
        .enumerate()
        .filter_map(|(ri, m)| m.map(|vi| (ri, vi)))
        .collect();
    let positions: Vec<usize> = pairs.iter().map(|&(_, vi)| vi).collect();
    pairs
        .into_iter()
        .zip(longest_increasing(&positions))
        .filter_map(|(pair, kept)| (!kept).then_some(pair))
        .collect()
}

fn reference_index(documents: &[Document], reference: Option<&str>) -> usize {
    let Some(name) = reference else {
        return 0;
    };
    documents
        .iter()
        .position(|d| d.id == name || d.variant == name)
        .unwrap_or_else(|| {
            warn!(reference = %name, fallback = %documents[0].id, "reference variant not found");
            0
        })
}

/// Align two variants and report drift, located in `variant`.
#[must_use]
pub fn align_pair(reference: &Document, variant: &Document, config: &CheckConfig) -> Vec<Finding> {
    let ref_heads = Heading::collect(reference);
    let var_heads = Heading::collect(variant);
    let pairing = pair_headings(&ref_heads, &var_heads, config.fuzzy_threshold);
    let severity = config.drift_severity;
    let mut findings = Vec::new();

    let var_location = |vi: usize| Location::of_section(variant, var_heads[vi].section);
    let ref_location = |ri: usize| Location::of_section(reference, ref_heads[ri].section);

    for (ri, head) in ref_heads.iter().enumerate() {
        let title = &head.section.title;
        match pairing.to_variant[ri] {
            None => {
                // Where the section would go: after the counterpart of the
                // closest preceding paired section.
                let location = pairing.to_variant[..ri].iter().rev().find_map(|m| *m).map_or_else(
                    || Location::of_section(variant, variant.preamble()),
                    var_location,
                );
                findings.push(Finding::drift(
                    severity,
                    DriftKind::MissingInVariant,
                    format!(
                        "section \"{title}\" (#{}) from {} is missing",
                        head.section.anchor, reference.id
                    ),
                    location,
                    Some(ref_location(ri)),
                ));
            }
            Some(vi) => {
                let counterpart = var_heads[vi].section;
                if let Some(distance) = pairing.fuzzy_distance[ri] {
                    findings.push(Finding::drift(
                        Severity::Info,
                        DriftKind::Renamed,
                        format!(
                            "section \"{}\" matched \"{title}\" in {} by title similarity (edit distance {distance})",
                            counterpart.title, reference.id
                        ),
                        var_location(vi),
                        Some(ref_location(ri)),
                    ));
                }
                if counterpart.depth != head.section.depth {
                    findings.push(Finding::drift(
                        severity,
                        DriftKind::DepthChanged,
                        format!(
                            "section \"{}\" is a level-{} heading but level-{} in {}",
                            counterpart.title, counterpart.depth, head.section.depth, reference.id
                        ),
                        var_location(vi),
                        Some(ref_location(ri)),
                    ));
                }
            }
        }
    }

    for (ri, vi) in out_of_order(&pairing.to_variant) {
        findings.push(Finding::drift(
            severity,
            DriftKind::Reordered,
            format!(
                "section \"{}\" is out of order relative to {}",
                var_heads[vi].section.title, reference.id
            ),
            var_location(vi),
            Some(ref_location(ri)),
        ));
    }

    for (vi, taken) in pairing.variant_taken.iter().enumerate() {
        if !taken {
            let section = var_heads[vi].section;
            findings.push(Finding::drift(
                severity,
                DriftKind::ExtraInVariant,
                format!(
                    "section \"{}\" (#{}) has no counterpart in {}",
                    section.title, section.anchor, reference.id
                ),
                var_location(vi),
                None,
            ));
        }
    }

    debug!(
        reference = %reference.id,
        variant = %variant.id,
        findings = findings.len(),
        "aligned sections"
    );
    findings
}

/// Align every document against the reference variant.
///
/// Fewer than two documents yield no findings.
#[must_use]
pub fn align_documents(documents: &[Document], config: &CheckConfig) -> Vec<Finding> {
    if documents.len() < 2 {
        return Vec::new();
    }
    let reference_idx = reference_index(documents, config.reference.as_deref());
    let reference = &documents[reference_idx];
    documents
        .iter()
        .enumerate()
        .filter(|&(idx, _)| idx != reference_idx)
        .flat_map(|(_, variant)| align_pair(reference, variant, config))
        .collect()
}
