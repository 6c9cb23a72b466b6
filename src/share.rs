/// Best-effort sharing
///
/// There is no share sheet on the desktop, so a share becomes a text
/// copied to the clipboard. Nothing here can fail loudly.

use crate::analysis::AnalysisResult;
use crate::config::Locale;

/// What would be handed to a platform share sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: Option<String>,
}

impl SharePayload {
    /// Invitation to try the app, shared from Setup
    pub fn app(locale: Locale, url: Option<&str>) -> Self {
        let (title, text) = match locale {
            Locale::English => (
                "Magic Prank Camera",
                "Try this magic camera that photographs your soul! 🤫",
            ),
            Locale::SimplifiedChinese => ("魔法恶作剧相机", "快来试试这个能拍出“灵魂”的魔法相机！🤫"),
        };
        Self {
            title: title.to_string(),
            text: text.to_string(),
            url: url.map(str::to_string),
        }
    }

    /// The revealed analysis, shared from Result
    pub fn analysis(locale: Locale, analysis: &AnalysisResult, url: Option<&str>) -> Self {
        let mut text = match locale {
            Locale::English => format!(
                "The magic camera captured: {}\n\"{}\"",
                analysis.title, analysis.description
            ),
            Locale::SimplifiedChinese => format!(
                "魔法相机捕捉到了：{}\n\"{}\"",
                analysis.title, analysis.description
            ),
        };
        if let Some(url) = url {
            let invite = match locale {
                Locale::English => "Try it",
                Locale::SimplifiedChinese => "试试这个",
            };
            let colon = if locale == Locale::English { ": " } else { "：" };
            text.push_str(&format!("\n\n{}{}{}", invite, colon, url));
        }
        Self {
            title: analysis.title.clone(),
            text,
            url: url.map(str::to_string),
        }
    }

    /// Single block of text for the clipboard
    pub fn clipboard_text(&self) -> String {
        match &self.url {
            Some(url) if !self.text.contains(url.as_str()) => format!("{}\n{}", self.text, url),
            _ => self.text.clone(),
        }
    }
}
