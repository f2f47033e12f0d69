//! Term attribution: ranked positive and negative drivers of predicted alpha.
//!
//! Each vocabulary term carries one signed importance from a fitted model.
//! Terms with a positive score and terms with a negative score form two
//! disjoint lists, each sorted by descending absolute score. Zero and
//! non-finite scores belong to neither list.

use crate::export::{ExportError, ExportFormat, Exporter, to_csv, to_json};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

/// A term and its signed importance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TermScore {
    /// Vocabulary term
    pub term: String,
    /// Signed importance
    pub score: f64,
}

impl TermScore {
    /// Create a new term score.
    pub fn new(term: impl Into<String>, score: f64) -> Self {
        Self {
            term: term.into(),
            score,
        }
    }
}

impl fmt::Display for TermScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:+.6}", self.term, self.score)
    }
}

/// Sign of a term's contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Raises predicted alpha
    Positive,
    /// Lowers predicted alpha
    Negative,
}

impl Direction {
    /// Lowercase label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }
}

/// One row of the full term impact table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TermImpact {
    /// Vocabulary term
    pub term: String,
    /// Signed importance
    pub score: f64,
    /// Absolute importance
    pub abs_score: f64,
}

/// Order by descending magnitude, then by term.
fn by_magnitude(a: &TermScore, b: &TermScore) -> Ordering {
    b.score
        .abs()
        .total_cmp(&a.score.abs())
        .then_with(|| a.term.cmp(&b.term))
}

fn pair_up(terms: &[String], importances: &[f64]) -> Result<Vec<TermScore>, ExportError> {
    if terms.len() != importances.len() {
        return Err(ExportError::InvalidFormat(format!(
            "{} terms but {} importances",
            terms.len(),
            importances.len()
        )));
    }
    let mut seen = HashSet::with_capacity(terms.len());
    if let Some(dup) = terms.iter().find(|t| !seen.insert(t.as_str())) {
        return Err(ExportError::InvalidFormat(format!("duplicate term '{}'", dup)));
    }
    Ok(terms
        .iter()
        .zip(importances)
        .map(|(term, &score)| TermScore::new(term.clone(), score))
        .collect())
}

/// Full impact table sorted by score, highest first (ties by term).
pub fn impact_table(terms: &[String], importances: &[f64]) -> Result<Vec<TermImpact>, ExportError> {
    let mut rows = pair_up(terms, importances)?;
    rows.retain(|s| s.score.is_finite());
    rows.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.term.cmp(&b.term)));
    Ok(rows
        .into_iter()
        .map(|s| TermImpact {
            abs_score: s.score.abs(),
            term: s.term,
            score: s.score,
        })
        .collect())
}

/// Ranked term lists for one horizon's model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttributionReport {
    /// Horizon in trading days
    pub horizon: usize,
    /// Model family that produced the scores
    pub family: String,
    /// Maximum terms per direction
    pub top_n: usize,
    /// Positive drivers, strongest first
    pub positive: Vec<TermScore>,
    /// Negative drivers, strongest first
    pub negative: Vec<TermScore>,
}

impl AttributionReport {
    /// Rank terms by signed importance.
    ///
    /// `terms[i]` is paired with `importances[i]`.
    ///
    /// # Errors
    /// [`ExportError::InvalidFormat`] if the slices differ in length or
    /// `terms` repeats a term.
    ///
    /// # Examples
    ///
    /// ```
    /// use riskalpha_output::AttributionReport;
    ///
    /// let terms = vec!["fuel".to_string(), "mobile".to_string(), "patent".to_string()];
    /// let report =
    ///     AttributionReport::from_importances(5, "ridge", &terms, &[-0.4, 0.9, 0.0], 20).unwrap();
    ///
    /// assert_eq!(report.positive[0].term, "mobile");
    /// assert_eq!(report.negative[0].term, "fuel");
    /// assert_eq!(report.positive.len() + report.negative.len(), 2);
    /// ```
    pub fn from_importances(
        horizon: usize,
        family: impl Into<String>,
        terms: &[String],
        importances: &[f64],
        top_n: usize,
    ) -> Result<Self, ExportError> {
        let scores = pair_up(terms, importances)?;

        let (mut positive, mut negative): (Vec<TermScore>, Vec<TermScore>) = scores
            .into_iter()
            .filter(|s| s.score.is_finite() && s.score != 0.0)
            .partition(|s| s.score > 0.0);

        positive.sort_by(by_magnitude);
        negative.sort_by(by_magnitude);
        positive.truncate(top_n);
        negative.truncate(top_n);

        Ok(Self {
            horizon,
            family: family.into(),
            top_n,
            positive,
            negative,
        })
    }

    /// Terms of one direction, strongest first.
    pub fn direction(&self, direction: Direction) -> &[TermScore] {
        match direction {
            Direction::Positive => &self.positive,
            Direction::Negative => &self.negative,
        }
    }

    /// Whether `term` is listed in `direction`.
    pub fn contains(&self, direction: Direction, term: &str) -> bool {
        self.direction(direction).iter().any(|s| s.term == term)
    }

    /// Rows of `(direction, rank, term, score)` with ranks starting at 1.
    pub fn rows(&self) -> Vec<AttributionRow> {
        [Direction::Positive, Direction::Negative]
            .into_iter()
            .flat_map(|direction| {
                self.direction(direction)
                    .iter()
                    .enumerate()
                    .map(move |(i, s)| AttributionRow {
                        direction,
                        rank: i + 1,
                        term: s.term.clone(),
                        score: s.score,
                    })
            })
            .collect()
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "\nTerm Attribution: T+{} ({})\n",
            self.horizon, self.family
        ));
        output.push_str(&"=".repeat(72));
        output.push('\n');
        output.push_str(&format!(
            "{:>4}  {:<24} {:>10}   {:<24} {:>10}\n",
            "Rank", "Positive", "Score", "Negative", "Score"
        ));
        output.push_str(&"-".repeat(72));
        output.push('\n');

        let rows = self.positive.len().max(self.negative.len());
        for i in 0..rows {
            let (pos_term, pos_score) = cell(self.positive.get(i));
            let (neg_term, neg_score) = cell(self.negative.get(i));
            output.push_str(&format!(
                "{:>4}  {:<24} {:>10}   {:<24} {:>10}\n",
                i + 1,
                pos_term,
                pos_score,
                neg_term,
                neg_score
            ));
        }
        output.push_str(&"=".repeat(72));
        output.push('\n');
        output
    }

    /// Format as Markdown for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "# Term Attribution: T+{} ({})\n\n",
            self.horizon, self.family
        ));
        for direction in [Direction::Positive, Direction::Negative] {
            let title = match direction {
                Direction::Positive => "Positive drivers",
                Direction::Negative => "Negative drivers",
            };
            output.push_str(&format!("## {}\n\n", title));
            output.push_str("| Rank | Term | Score |\n");
            output.push_str("|------|------|-------|\n");
            for (i, s) in self.direction(direction).iter().enumerate() {
                output.push_str(&format!("| {} | {} | {:.6} |\n", i + 1, s.term, s.score));
            }
            output.push('\n');
        }
        output
    }
}

fn cell(score: Option<&TermScore>) -> (String, String) {
    score.map_or_else(
        || (String::new(), String::new()),
        |s| (s.term.clone(), format!("{:+.4}", s.score)),
    )
}

impl fmt::Display for AttributionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Attribution for T+{} ({}):", self.horizon, self.family)?;
        writeln!(f, "  Positive:")?;
        for s in &self.positive {
            writeln!(f, "    {}", s)?;
        }
        writeln!(f, "  Negative:")?;
        for s in &self.negative {
            writeln!(f, "    {}", s)?;
        }
        Ok(())
    }
}

/// Flattened attribution row for CSV export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttributionRow {
    /// Direction of the contribution
    pub direction: Direction,
    /// Rank within the direction, starting at 1
    pub rank: usize,
    /// Vocabulary term
    pub term: String,
    /// Signed importance
    pub score: f64,
}

impl Exporter for AttributionReport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => to_csv(self.rows()),
            _ => to_json(self, format),
        }
    }
}

impl Exporter for [TermImpact] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => to_csv(self),
            _ => to_json(self, format),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn terms(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_partition_and_order() {
        let report = AttributionReport::from_importances(
            1,
            "ridge",
            &terms(&["a", "b", "c", "d", "e"]),
            &[0.1, -0.7, 0.5, -0.2, 0.0],
            20,
        )
        .unwrap();

        let pos: Vec<_> = report.positive.iter().map(|s| s.term.as_str()).collect();
        let neg: Vec<_> = report.negative.iter().map(|s| s.term.as_str()).collect();
        assert_eq!(pos, vec!["c", "a"]);
        assert_eq!(neg, vec!["b", "d"]);
        assert!(!report.contains(Direction::Positive, "e"));
        assert!(!report.contains(Direction::Negative, "e"));
    }

    #[rstest]
    #[case(1, 1, 1)]
    #[case(2, 2, 2)]
    #[case(10, 3, 2)]
    fn test_top_n(#[case] top_n: usize, #[case] n_pos: usize, #[case] n_neg: usize) {
        let report = AttributionReport::from_importances(
            5,
            "ridge",
            &terms(&["a", "b", "c", "d", "e"]),
            &[0.3, 0.2, 0.1, -0.1, -0.2],
            top_n,
        )
        .unwrap();
        assert_eq!(report.positive.len(), n_pos);
        assert_eq!(report.negative.len(), n_neg);
    }

    #[test]
    fn test_ties_broken_by_term() {
        let report =
            AttributionReport::from_importances(1, "ridge", &terms(&["zeta", "alpha"]), &[0.5, 0.5], 5)
                .unwrap();
        assert_eq!(report.positive[0].term, "alpha");
    }

    #[test]
    fn test_length_mismatch() {
        let result = AttributionReport::from_importances(1, "ridge", &terms(&["a"]), &[0.1, 0.2], 5);
        assert!(matches!(result, Err(ExportError::InvalidFormat(_))));
    }

    #[test]
    fn test_duplicate_terms_rejected() {
        let result = AttributionReport::from_importances(1, "ridge", &terms(&["a", "a"]), &[0.1, 0.2], 5);
        assert!(result.is_err());
    }

    #[test]
    fn test_impact_table_sorted_by_score() {
        let table = impact_table(&terms(&["a", "b", "c"]), &[-0.3, 0.2, 0.0]).unwrap();
        let order: Vec<_> = table.iter().map(|r| r.term.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
        assert_eq!(table[2].abs_score, 0.3);
    }

    #[test]
    fn test_csv_rows() {
        let report =
            AttributionReport::from_importances(10, "ridge", &terms(&["fuel", "mobile"]), &[-0.25, 0.5], 5)
                .unwrap();
        let csv = report.export_to_string(ExportFormat::Csv).unwrap();
        assert_eq!(
            csv,
            "direction,rank,term,score\npositive,1,mobile,0.5\nnegative,1,fuel,-0.25\n"
        );
    }

    #[test]
    fn test_renderings() {
        let report =
            AttributionReport::from_importances(10, "ridge", &terms(&["fuel", "mobile"]), &[-0.25, 0.5], 5)
                .unwrap();
        let ascii = report.to_ascii_table();
        assert!(ascii.contains("T+10"));
        assert!(ascii.contains("mobile"));
        let markdown = report.to_markdown();
        assert!(markdown.contains("## Negative drivers"));
        assert!(markdown.contains("| 1 | fuel |"));
    }
}
