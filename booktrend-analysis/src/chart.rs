//! SVG chart rendering for genre reports.
//!
//! Charts are emitted as standalone SVG documents. Each renderer returns
//! `None` when the underlying aggregate holds no data so callers can skip the
//! file entirely.

use std::fmt;

use booktrend_core::GenreName;

use crate::{AuthorCount, DecadeHistogram, GenreAnalysis};

/// Label of the slice grouping authors beyond the slice cap.
pub const OTHERS_LABEL: &str = "Others";

const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];
const FONT: &str = "font-family=\"DejaVu Sans, Arial, sans-serif\"";

/// Charts produced for every analysed genre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    /// Bar chart of books per decade.
    DecadeDistribution,
    /// Pie chart of the top authors' share of books.
    TopAuthorsPie,
    /// Bar chart of books per top author.
    TopAuthorsBar,
}

impl ChartKind {
    /// Every chart, in rendering order.
    pub const ALL: [Self; 3] = [
        Self::DecadeDistribution,
        Self::TopAuthorsPie,
        Self::TopAuthorsBar,
    ];

    /// File name suffix shared by every genre.
    #[must_use]
    pub const fn file_suffix(self) -> &'static str {
        match self {
            Self::DecadeDistribution => "decade_distribution",
            Self::TopAuthorsPie => "top_authors_pie",
            Self::TopAuthorsBar => "top_authors_bar",
        }
    }

    /// SVG file name for `genre`.
    #[must_use]
    pub fn file_name(self, genre: &GenreName) -> String {
        format!("{}_{}.svg", genre.file_stem(), self.file_suffix())
    }

    /// Render this chart from `analysis`, or `None` when it has no data.
    #[must_use]
    pub fn render(self, analysis: &GenreAnalysis, max_slices: usize) -> Option<String> {
        match self {
            Self::DecadeDistribution => analysis
                .decades
                .as_ref()
                .map(|histogram| decade_bar_chart(&analysis.genre, histogram)),
            Self::TopAuthorsPie => {
                author_pie_chart(&analysis.genre, &analysis.top_authors, max_slices)
            }
            Self::TopAuthorsBar => author_bar_chart(&analysis.genre, &analysis.top_authors),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::DecadeDistribution => "decade distribution",
            Self::TopAuthorsPie => "top authors pie",
            Self::TopAuthorsBar => "top authors bar",
        };
        f.write_str(label)
    }
}

/// One wedge of the author pie chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieSlice {
    /// Legend label.
    pub label: String,
    /// Books represented by the wedge.
    pub books: u64,
}

/// Group `authors` into at most `max_slices` wedges.
///
/// When the ranking is longer than the cap, the first `max_slices - 1`
/// authors keep their own wedge and the rest are summed into
/// [`OTHERS_LABEL`].
///
/// # Examples
///
/// ```
/// use booktrend_analysis::{AuthorCount, pie_slices};
///
/// let authors: Vec<_> = ["A", "B", "C", "D"]
///     .into_iter()
///     .map(|name| AuthorCount::new(name, 2))
///     .collect();
/// let slices = pie_slices(&authors, 3);
/// let labels: Vec<_> = slices.iter().map(|slice| slice.label.as_str()).collect();
/// assert_eq!(labels, ["A", "B", "Others"]);
/// assert_eq!(slices.last().map(|slice| slice.books), Some(4));
/// ```
#[must_use]
pub fn pie_slices(authors: &[AuthorCount], max_slices: usize) -> Vec<PieSlice> {
    let max_slices = max_slices.max(1);
    let slice = |entry: &AuthorCount| PieSlice {
        label: entry.author.clone(),
        books: entry.books,
    };
    if authors.len() <= max_slices {
        return authors.iter().map(slice).collect();
    }

    let kept = max_slices.saturating_sub(1);
    let mut slices: Vec<_> = authors.iter().take(kept).map(slice).collect();
    let others: u64 = authors.iter().skip(kept).map(|entry| entry.books).sum();
    if others > 0 {
        slices.push(PieSlice {
            label: OTHERS_LABEL.to_owned(),
            books: others,
        });
    }
    slices
}

/// Bar chart of books per decade, labelled `1980s`, `1990s` and so on.
#[must_use]
pub fn decade_bar_chart(genre: &GenreName, histogram: &DecadeHistogram) -> String {
    BarChart {
        width: 1000.0,
        height: 600.0,
        title: format!("Books Published per Decade in '{genre}' Genre"),
        x_label: "Decade",
        y_label: "Number of Books Published",
        fill: "skyblue",
        value_labels: false,
        bars: histogram
            .iter()
            .map(|(decade, count)| (format!("{decade}s"), count))
            .collect(),
    }
    .render()
}

/// Pie chart of the top authors, or `None` when there are no authors.
#[must_use]
pub fn author_pie_chart(
    genre: &GenreName,
    authors: &[AuthorCount],
    max_slices: usize,
) -> Option<String> {
    if authors.is_empty() {
        return None;
    }
    let slices = pie_slices(authors, max_slices);
    Some(render_pie(
        &format!("Book Distribution by Top Authors in '{genre}' Genre"),
        &slices,
    ))
}

/// Bar chart of the top authors with value labels, or `None` when there are
/// no authors.
#[must_use]
pub fn author_bar_chart(genre: &GenreName, authors: &[AuthorCount]) -> Option<String> {
    if authors.is_empty() {
        return None;
    }
    let chart = BarChart {
        width: 1200.0,
        height: 700.0,
        title: format!(
            "Top {} Authors by Book Count in '{genre}' Genre",
            authors.len()
        ),
        x_label: "Author",
        y_label: "Number of Books",
        fill: "lightcoral",
        value_labels: true,
        bars: authors
            .iter()
            .map(|entry| (entry.author.clone(), entry.books))
            .collect(),
    };
    Some(chart.render())
}

struct BarChart {
    width: f64,
    height: f64,
    title: String,
    x_label: &'static str,
    y_label: &'static str,
    fill: &'static str,
    value_labels: bool,
    bars: Vec<(String, u64)>,
}

impl BarChart {
    const LEFT: f64 = 80.0;
    const RIGHT: f64 = 30.0;
    const TOP: f64 = 60.0;
    const BOTTOM: f64 = 150.0;

    fn render(&self) -> String {
        let plot_width = self.width - Self::LEFT - Self::RIGHT;
        let plot_height = self.height - Self::TOP - Self::BOTTOM;
        let baseline = Self::TOP + plot_height;
        let max = self.bars.iter().map(|(_, count)| *count).max().unwrap_or(0);
        let step = tick_step(max);
        let y_top = max.div_ceil(step).max(1).saturating_mul(step);
        let scale = plot_height / as_f64(y_top);
        let slot = plot_width / as_f64(self.bars.len().max(1) as u64);

        let mut svg = open_svg(self.width, self.height);
        svg.push_str(&text(
            self.width / 2.0,
            Self::TOP / 2.0,
            "middle",
            "16",
            &self.title,
        ));

        let mut tick = 0;
        while tick <= y_top {
            let y = baseline - as_f64(tick) * scale;
            svg.push_str(&format!(
                "<line x1=\"{:.1}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"#dddddd\"/>\n",
                Self::LEFT,
                Self::LEFT + plot_width,
            ));
            svg.push_str(&text(Self::LEFT - 8.0, y + 4.0, "end", "11", &tick.to_string()));
            tick = tick.saturating_add(step);
        }

        let mut x = Self::LEFT;
        for (label, count) in &self.bars {
            let bar_height = as_f64(*count) * scale;
            let centre = x + slot / 2.0;
            svg.push_str(&format!(
                "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{bar_height:.1}\" fill=\"{}\"/>\n",
                x + slot * 0.1,
                baseline - bar_height,
                slot * 0.8,
                self.fill,
            ));
            if self.value_labels {
                svg.push_str(&text(
                    centre,
                    baseline - bar_height - 4.0,
                    "middle",
                    "10",
                    &count.to_string(),
                ));
            }
            svg.push_str(&format!(
                "<text x=\"{centre:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"11\" {FONT} transform=\"rotate(-45 {centre:.1} {:.1})\">{}</text>\n",
                baseline + 14.0,
                baseline + 14.0,
                escape(label),
            ));
            x += slot;
        }

        svg.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"{baseline:.1}\" x2=\"{:.1}\" y2=\"{baseline:.1}\" stroke=\"#333333\"/>\n",
            Self::LEFT,
            Self::LEFT + plot_width,
        ));
        svg.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{baseline:.1}\" stroke=\"#333333\"/>\n",
            Self::LEFT,
            Self::TOP,
            Self::LEFT,
        ));
        svg.push_str(&text(
            Self::LEFT + plot_width / 2.0,
            self.height - 12.0,
            "middle",
            "13",
            self.x_label,
        ));
        let y_centre = Self::TOP + plot_height / 2.0;
        svg.push_str(&format!(
            "<text x=\"20\" y=\"{y_centre:.1}\" text-anchor=\"middle\" font-size=\"13\" {FONT} transform=\"rotate(-90 20 {y_centre:.1})\">{}</text>\n",
            escape(self.y_label),
        ));
        svg.push_str("</svg>\n");
        svg
    }
}

fn render_pie(title: &str, slices: &[PieSlice]) -> String {
    const WIDTH: f64 = 1000.0;
    const HEIGHT: f64 = 800.0;
    const CX: f64 = 360.0;
    const CY: f64 = 430.0;
    const RADIUS: f64 = 300.0;

    let total: u64 = slices.iter().map(|slice| slice.books).sum();
    let mut svg = open_svg(WIDTH, HEIGHT);
    svg.push_str(&text(WIDTH / 2.0, 50.0, "middle", "18", title));

    let mut start = 90.0_f64;
    for (slice, colour) in slices.iter().zip(PALETTE.iter().cycle()) {
        if total == 0 {
            break;
        }
        let fraction = as_f64(slice.books) / as_f64(total);
        let sweep = 360.0 * fraction;
        let end = start + sweep;
        if fraction >= 1.0 {
            svg.push_str(&format!(
                "<circle cx=\"{CX:.1}\" cy=\"{CY:.1}\" r=\"{RADIUS:.1}\" fill=\"{colour}\" stroke=\"white\" stroke-width=\"1.5\"/>\n"
            ));
        } else {
            let (x0, y0) = polar(CX, CY, RADIUS, start);
            let (x1, y1) = polar(CX, CY, RADIUS, end);
            let large_arc = u8::from(sweep > 180.0);
            svg.push_str(&format!(
                "<path d=\"M {CX:.1} {CY:.1} L {x0:.2} {y0:.2} A {RADIUS:.1} {RADIUS:.1} 0 {large_arc} 0 {x1:.2} {y1:.2} Z\" fill=\"{colour}\" stroke=\"white\" stroke-width=\"1.5\"/>\n"
            ));
        }
        let (lx, ly) = polar(CX, CY, RADIUS * 0.6, start + sweep / 2.0);
        svg.push_str(&format!(
            "<text x=\"{lx:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"10\" font-weight=\"bold\" fill=\"white\" {FONT}>{:.1}%</text>\n",
            ly + 4.0,
            fraction * 100.0,
        ));
        start = end;
    }

    let legend_x = CX + RADIUS + 60.0;
    let mut legend_y = CY - RADIUS / 2.0;
    svg.push_str(&text(legend_x, legend_y, "start", "13", "Authors"));
    for (slice, colour) in slices.iter().zip(PALETTE.iter().cycle()) {
        legend_y += 24.0;
        svg.push_str(&format!(
            "<rect x=\"{legend_x:.1}\" y=\"{:.1}\" width=\"14\" height=\"14\" fill=\"{colour}\"/>\n",
            legend_y - 12.0,
        ));
        svg.push_str(&text(legend_x + 22.0, legend_y, "start", "12", &slice.label));
    }

    svg.push_str("</svg>\n");
    svg
}

/// Point at `degrees` (counter-clockwise from the positive x axis) on a
/// circle, in SVG's downward y coordinates.
fn polar(cx: f64, cy: f64, radius: f64, degrees: f64) -> (f64, f64) {
    let radians = degrees.to_radians();
    (cx + radius * radians.cos(), cy - radius * radians.sin())
}

/// Smallest 1-2-5 step giving at most five intervals up to `max`.
fn tick_step(max: u64) -> u64 {
    let mut magnitude: u64 = 1;
    loop {
        for factor in [1, 2, 5] {
            let step = magnitude.saturating_mul(factor);
            if max.div_ceil(step) <= 5 {
                return step;
            }
        }
        magnitude = magnitude.saturating_mul(10);
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "chart counts stay far below the f64 mantissa limit"
)]
fn as_f64(value: u64) -> f64 {
    value as f64
}

fn open_svg(width: f64, height: f64) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n"
    )
}

fn text(x: f64, y: f64, anchor: &str, size: &str, content: &str) -> String {
    format!(
        "<text x=\"{x:.1}\" y=\"{y:.1}\" text-anchor=\"{anchor}\" font-size=\"{size}\" {FONT}>{}</text>\n",
        escape(content)
    )
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use booktrend_core::GenreId;
    use rstest::{fixture, rstest};

    #[fixture]
    fn genre() -> GenreName {
        GenreName::new("Horror").expect("valid genre")
    }

    fn authors(counts: &[u64]) -> Vec<AuthorCount> {
        counts
            .iter()
            .enumerate()
            .map(|(index, books)| AuthorCount::new(format!("Author {index}"), *books))
            .collect()
    }

    #[rstest]
    #[case(&[5, 4, 3], 5, &["Author 0", "Author 1", "Author 2"], 12)]
    #[case(&[5, 4, 3, 2, 1], 5, &["Author 0", "Author 1", "Author 2", "Author 3", "Author 4"], 15)]
    #[case(&[5, 4, 3, 2, 1, 1], 5, &["Author 0", "Author 1", "Author 2", "Author 3", "Others"], 16)]
    #[case(&[9, 1, 1], 1, &["Others"], 11)]
    fn groups_small_slices(
        #[case] counts: &[u64],
        #[case] max_slices: usize,
        #[case] labels: &[&str],
        #[case] total: u64,
    ) {
        let slices = pie_slices(&authors(counts), max_slices);
        let found: Vec<_> = slices.iter().map(|slice| slice.label.as_str()).collect();
        assert_eq!(found, labels);
        assert_eq!(slices.iter().map(|slice| slice.books).sum::<u64>(), total);
        assert!(slices.len() <= max_slices);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(4, 1)]
    #[case(7, 2)]
    #[case(23, 5)]
    #[case(140, 50)]
    fn picks_round_tick_steps(#[case] max: u64, #[case] step: u64) {
        assert_eq!(tick_step(max), step);
    }

    #[rstest]
    fn decade_chart_labels_each_decade(genre: GenreName) {
        let histogram: DecadeHistogram = [(1970, 3), (1980, 1)].into_iter().collect();
        let svg = decade_bar_chart(&genre, &histogram);

        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.contains("Books Published per Decade in &apos;Horror&apos; Genre"));
        assert!(svg.contains(">1970s</text>"));
        assert!(svg.contains(">1980s</text>"));
        assert_eq!(svg.matches("fill=\"skyblue\"").count(), 2);
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[rstest]
    fn author_charts_are_skipped_without_data(genre: GenreName) {
        assert_eq!(author_pie_chart(&genre, &[], 5), None);
        assert_eq!(author_bar_chart(&genre, &[]), None);
    }

    #[rstest]
    fn author_bar_chart_labels_values(genre: GenreName) {
        let svg = author_bar_chart(&genre, &[AuthorCount::new("Poe & Co <Ltd>", 7)])
            .expect("chart for one author");
        assert!(svg.contains("Top 1 Authors by Book Count"));
        assert!(svg.contains("Poe &amp; Co &lt;Ltd&gt;"));
        assert!(svg.contains(">7</text>"));
    }

    #[rstest]
    fn pie_chart_shows_percentages_and_legend(genre: GenreName) {
        let svg = author_pie_chart(&genre, &authors(&[3, 1]), 5).expect("pie chart");
        assert!(svg.contains(">75.0%</text>"));
        assert!(svg.contains(">25.0%</text>"));
        assert!(svg.contains(">Authors</text>"));
        assert_eq!(svg.matches("<path ").count(), 2);
    }

    #[rstest]
    fn single_author_pie_is_a_full_circle(genre: GenreName) {
        let svg = author_pie_chart(&genre, &authors(&[4]), 5).expect("pie chart");
        assert!(svg.contains("<circle "));
        assert!(svg.contains(">100.0%</text>"));
    }

    #[rstest]
    fn render_dispatches_by_kind(genre: GenreName) {
        let analysis = GenreAnalysis {
            genre,
            genre_id: GenreId::new(1),
            total_books: 2,
            decades: None,
            top_authors: authors(&[2]),
        };
        assert_eq!(ChartKind::DecadeDistribution.render(&analysis, 5), None);
        assert!(ChartKind::TopAuthorsPie.render(&analysis, 5).is_some());
        assert!(ChartKind::TopAuthorsBar.render(&analysis, 5).is_some());
    }
}
