//! Design suggestions.

use super::ServiceResult;
use async_trait::async_trait;
use ic_core::SceneSummary;

#[async_trait]
pub trait Suggester: Send + Sync {
    /// Suggestion text for the current scene. `prompt` is the user's request,
    /// possibly empty.
    async fn suggest(&self, prompt: &str, summary: &SceneSummary) -> ServiceResult<String>;
}

const EMPTY_SCENE_HINT: &str = "Start by drawing some shapes or adding text to get AI suggestions!";
const NEEDS_TEXT_HINT: &str = "Consider adding text labels to your shapes";
const NEEDS_SHAPES_HINT: &str = "Try adding some shapes to complement your text";

const GENERAL_TIPS: &[&str] = &[
    "Try adding more visual hierarchy to your design",
    "Consider using complementary colors for better contrast",
    "Add some spacing between elements for better readability",
    "Use consistent typography throughout your design",
    "Apply AI enhance to improve colors and visibility",
    "Try the auto-complete feature to finish incomplete shapes",
    "Use text-to-image to generate creative elements",
];

/// Rule-based suggester that never leaves the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalSuggester;

impl LocalSuggester {
    pub fn new() -> Self {
        Self
    }

    /// One suggestion per entry, most specific first.
    pub fn tips(summary: &SceneSummary) -> Vec<&'static str> {
        if summary.total() == 0 {
            return vec![EMPTY_SCENE_HINT];
        }
        let has_shapes = summary.shapes() > 0;
        let has_text = summary.texts > 0;
        let lead = match (has_shapes, has_text) {
            (true, false) => Some(NEEDS_TEXT_HINT),
            (false, true) => Some(NEEDS_SHAPES_HINT),
            _ => None,
        };
        match lead {
            Some(lead) => std::iter::once(lead).chain(GENERAL_TIPS.iter().copied().take(3)).collect(),
            None => GENERAL_TIPS.iter().copied().take(4).collect(),
        }
    }
}

#[async_trait]
impl Suggester for LocalSuggester {
    async fn suggest(&self, prompt: &str, summary: &SceneSummary) -> ServiceResult<String> {
        log::debug!("local suggestion for {} objects (prompt: {prompt:?})", summary.total());
        Ok(Self::tips(summary).join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_scene_gets_a_starter_hint() {
        let tips = LocalSuggester::tips(&SceneSummary::default());
        assert_eq!(tips, vec![EMPTY_SCENE_HINT]);
    }

    #[test]
    fn shapes_without_text_suggest_labels() {
        let summary = SceneSummary {
            circles: 2,
            ..Default::default()
        };
        let tips = LocalSuggester::tips(&summary);
        assert_eq!(tips.len(), 4);
        assert_eq!(tips[0], NEEDS_TEXT_HINT);
    }

    #[test]
    fn text_without_shapes_suggests_shapes() {
        let summary = SceneSummary {
            texts: 1,
            ..Default::default()
        };
        assert_eq!(LocalSuggester::tips(&summary)[0], NEEDS_SHAPES_HINT);
    }

    #[test]
    fn mixed_scene_gets_general_tips() {
        let summary = SceneSummary {
            rectangles: 1,
            texts: 1,
            ..Default::default()
        };
        assert_eq!(LocalSuggester::tips(&summary), GENERAL_TIPS[..4].to_vec());
    }

    #[tokio::test]
    async fn suggest_joins_tips_by_line() {
        let text = LocalSuggester::new()
            .suggest("", &SceneSummary::default())
            .await
            .unwrap();
        assert_eq!(text, EMPTY_SCENE_HINT);
    }
}
