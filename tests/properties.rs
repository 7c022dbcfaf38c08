//! Property-based tests for the pagination pipeline.
//!
//! Random lyric lines and passages are paginated with a monospace face, so
//! widths equal character counts, and the results are checked for:
//! 1. Width: no display line is wider than the line budget, also measured
//!    with a proportional face
//! 2. Height: every page fits the height budget
//! 3. Protected spans stay on one line
//! 4. No content loss: words come out in order, nothing dropped or added
//! 5. Idempotent rebalancing
//! 6. Determinism

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use slide_fit::{
    paginate_with, split_clauses, ContentKind, FitSpec, FontFace, FontRequest, HeuristicFace,
    LineWrapper, Packer, Page, PaginationConfig, Rebalancer, SemanticUnit,
};

// -- Strategies --

fn word_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{1,14}").expect("valid regex")
}

fn line_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(word_strategy(), 1..8).prop_map(|words| words.join(" "))
}

fn lines_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(line_strategy(), 1..12)
}

/// Width, height and gap of a container, in monospace characters and points
fn fit_strategy() -> impl Strategy<Value = FitSpec> {
    (12u32..40, 1u32..8, 0u32..5).prop_map(|(width, lines, gap)| FitSpec {
        usable_width: width as f32,
        usable_height: (lines * 10) as f32,
        line_height: 10.0,
        unit_gap: gap as f32,
        width_safety: 1.0,
        height_safety: 1.0,
        font: FontRequest::new("Monospace", 1.0),
    })
}

/// Slide-sized containers for a 20pt proportional face
fn proportional_fit_strategy() -> impl Strategy<Value = FitSpec> {
    (150u32..600, 1u32..8, 0u32..12).prop_map(|(width, lines, gap)| FitSpec {
        usable_width: width as f32,
        usable_height: (lines * 24) as f32,
        line_height: 24.0,
        unit_gap: gap as f32,
        width_safety: 1.0,
        height_safety: 1.0,
        font: FontRequest::new("Sans", 20.0),
    })
}

fn kind_strategy() -> impl Strategy<Value = ContentKind> {
    prop_oneof![Just(ContentKind::Lyrics), Just(ContentKind::Scripture)]
}

// -- Helpers --

fn face() -> HeuristicFace {
    HeuristicFace::monospace(1.0, 1.0)
}

fn units_of(lines: &[String]) -> Vec<SemanticUnit> {
    lines.iter().map(|line| SemanticUnit::new(line)).collect()
}

/// Lyric lines become units as they are; scripture runs them into one passage
fn units_for(kind: ContentKind, lines: &[String]) -> Vec<SemanticUnit> {
    match kind {
        ContentKind::Lyrics => units_of(lines),
        ContentKind::Scripture => {
            let mut passage = String::new();
            for (i, line) in lines.iter().enumerate() {
                if i > 0 {
                    passage.push_str([", ", "; ", ". "][i % 3]);
                }
                passage.push_str(line);
            }
            passage.push('.');
            split_clauses(&passage)
        }
    }
}

fn paginate(units: &[SemanticUnit], fit: &FitSpec, kind: ContentKind) -> Vec<Page> {
    paginate_with(units, fit, &face(), &PaginationConfig::for_kind(kind))
}

fn squeeze(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn page_words(pages: &[Page]) -> String {
    pages
        .iter()
        .flat_map(|p| p.lines.iter())
        .map(|l| squeeze(&l.text))
        .collect()
}

// -- Properties --

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_lines_fit_width(lines in lines_strategy(), fit in fit_strategy(), kind in kind_strategy()) {
        let pages = paginate(&units_of(&lines), &fit, kind);
        for line in pages.iter().flat_map(|p| p.lines.iter()) {
            prop_assert!(
                line.text.chars().count() as f32 <= fit.max_line_width(),
                "line {:?} wider than {}",
                line.text,
                fit.max_line_width()
            );
        }
    }

    #[test]
    fn prop_proportional_lines_fit_width(
        lines in lines_strategy(),
        fit in proportional_fit_strategy(),
        kind in kind_strategy(),
    ) {
        let face = HeuristicFace::proportional("Sans", 20.0);
        let units = units_for(kind, &lines);
        let pages = paginate_with(&units, &fit, &face, &PaginationConfig::for_kind(kind));
        for line in pages.iter().flat_map(|p| p.lines.iter()) {
            let width = face.measure(&line.text);
            prop_assert!(
                width <= fit.max_line_width() + 1e-3,
                "line {:?} measures {} of {}",
                line.text,
                width,
                fit.max_line_width()
            );
        }
    }

    #[test]
    fn prop_pages_fit_height(lines in lines_strategy(), fit in fit_strategy(), kind in kind_strategy()) {
        let pages = paginate(&units_of(&lines), &fit, kind);
        for (i, page) in pages.iter().enumerate() {
            prop_assert!(
                page.fits(&fit),
                "page {} uses {} of {}",
                i,
                page.used_height(&fit),
                fit.max_page_height()
            );
        }
    }

    #[test]
    fn prop_no_content_loss(lines in lines_strategy(), fit in fit_strategy(), kind in kind_strategy()) {
        let units = units_of(&lines);
        let pages = paginate(&units, &fit, kind);
        let input: String = lines.iter().map(|l| squeeze(l)).collect();
        prop_assert_eq!(page_words(&pages), input);
    }

    #[test]
    fn prop_protected_span_stays_whole(
        before in line_strategy(),
        phrase in prop::collection::vec("[a-z]{1,4}", 2..3),
        after in line_strategy(),
        fit in fit_strategy(),
    ) {
        let protected = format!("[{}]", phrase.join(" "));
        let units = vec![
            SemanticUnit::new(&before),
            SemanticUnit::new(&format!("{} {} {}", before, protected, after)),
        ];
        let pages = paginate(&units, &fit, ContentKind::Lyrics);

        let found = pages
            .iter()
            .flat_map(|p| p.lines.iter())
            .filter(|l| l.unit == 1)
            .any(|l| l.text.contains(&protected));
        prop_assert!(found, "{:?} broken across lines", protected);
    }

    #[test]
    fn prop_protected_span_stays_whole_in_prose(
        before in line_strategy(),
        phrase in prop::collection::vec("[a-z]{1,4}", 2..3),
        after in line_strategy(),
        fit in fit_strategy(),
    ) {
        let protected = format!("[{}]", phrase.join(" "));
        let units = split_clauses(&format!("{}, {} {}.", before, protected, after));
        let pages = paginate(&units, &fit, ContentKind::Scripture);

        let found = pages
            .iter()
            .flat_map(|p| p.lines.iter())
            .any(|l| l.text.contains(&protected));
        prop_assert!(found, "{:?} broken across lines", protected);
    }

    #[test]
    fn prop_rebalancing_is_idempotent(lines in lines_strategy(), fit in fit_strategy(), kind in kind_strategy()) {
        let face = face();
        let config = PaginationConfig::for_kind(kind);
        let wrapper = LineWrapper::new(&face, &config.wrap);
        let packer = Packer::new(&wrapper, &fit, config.flow());
        let rebalancer = Rebalancer::new(&packer, &config.rebalance);

        let units = units_for(kind, &lines);
        let once = rebalancer.rebalance(&units, packer.pack(&units));
        let twice = rebalancer.rebalance(&units, once.clone());
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn prop_deterministic(lines in lines_strategy(), fit in fit_strategy(), kind in kind_strategy()) {
        let units = units_of(&lines);
        let first = serde_json::to_string(&paginate(&units, &fit, kind)).expect("serializable");
        let second = serde_json::to_string(&paginate(&units, &fit, kind)).expect("serializable");
        prop_assert_eq!(first, second);
    }
}

// -- Scenarios --

fn texts(pages: &[Page]) -> Vec<Vec<&str>> {
    pages
        .iter()
        .map(|p| p.lines.iter().map(|l| l.text.as_str()).collect())
        .collect()
}

fn exact_fit(width: f32, lines: u32) -> FitSpec {
    FitSpec {
        usable_width: width,
        usable_height: (lines * 10) as f32,
        line_height: 10.0,
        unit_gap: 0.0,
        width_safety: 1.0,
        height_safety: 1.0,
        font: FontRequest::new("Monospace", 1.0),
    }
}

#[test]
fn test_amazing_grace_wraps_without_orphan() {
    let face = face();
    let rules = Default::default();
    let wrapper = LineWrapper::new(&face, &rules);
    let lines = wrapper.wrap(&SemanticUnit::new("Amazing grace, how sweet the sound"), 20.0);

    let lines: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(lines, vec!["Amazing grace, how", "sweet the sound"]);
}

#[test]
fn test_trailing_amen_joins_previous_clause() {
    let units = split_clauses("For God so loved the world, that he gave his only begotten Son: Amen.");
    assert!(units.len() >= 2);
    assert!(units.iter().all(|u| u.text() != "Amen."));
    assert!(units.last().is_some_and(|u| u.text().ends_with("Son: Amen.")));
}

#[test]
fn test_lonely_fifth_unit_gets_company() {
    let face = face();
    let fit = exact_fit(20.0, 4);
    let config = PaginationConfig::default();
    let wrapper = LineWrapper::new(&face, &config.wrap);
    let packer = Packer::new(&wrapper, &fit, config.flow());
    let units: Vec<SemanticUnit> = ["u1", "u2", "u3", "u4", "u5"]
        .iter()
        .map(|t| SemanticUnit::new(t))
        .collect();

    let packed = packer.pack(&units);
    assert_eq!(texts(&packed), vec![vec!["u1", "u2", "u3", "u4"], vec!["u5"]]);

    let rebalanced = Rebalancer::new(&packer, &config.rebalance).rebalance(&units, packed);
    assert_eq!(texts(&rebalanced), vec![vec!["u1", "u2", "u3"], vec!["u4", "u5"]]);
    assert_eq!(rebalanced[1].units, 3..5);
}

#[test]
fn test_oversized_unit_is_hard_split() {
    let fit = exact_fit(10.0, 2);
    let units = vec![SemanticUnit::new("one two three four five six seven"), SemanticUnit::new("amen")];
    let pages = paginate(&units, &fit, ContentKind::Lyrics);

    assert!(pages.iter().all(|p| p.fits(&fit)));
    assert_eq!(pages.last().map(|p| p.text()), Some("amen".to_string()));
    assert_eq!(page_words(&pages), "onetwothreefourfivesixsevenamen");
}
