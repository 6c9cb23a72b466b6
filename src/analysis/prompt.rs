//! Fixed prompt text and fallback results per locale

use super::AnalysisResult;
use crate::config::Locale;

const PROMPT_EN: &str = "You are a mysterious spirit living inside a magic camera. \
This image has just appeared, replacing what the user actually photographed. \
1. Give it a short, cryptic title (3-5 words). \
2. Write one short, playful or mysterious sentence explaining why this image appeared \
(for example \"This is your true aura\" or \"A glitch in the matrix revealed this\"). \
Answer in English. Return JSON.";

const PROMPT_ZH: &str = "你是一个住在魔法相机里的神秘精灵。\
这张图片刚刚出现，取代了用户实际拍摄的内容。\
1. 给它一个简短、神秘的标题（3-5个字）。\
2. 写一句简短、有趣或神秘的解释，说明为什么会出现这张图片\
（例如“这是你的真实气场”，“矩阵的故障揭示了这一点”）。\
请用中文回答。返回 JSON。";

/// Instruction sent alongside the image
pub fn prompt_for(locale: Locale) -> &'static str {
    match locale {
        Locale::English => PROMPT_EN,
        Locale::SimplifiedChinese => PROMPT_ZH,
    }
}

/// Result shown when no credential is configured
pub fn configuration_fallback(locale: Locale) -> AnalysisResult {
    match locale {
        Locale::English => AnalysisResult::new(
            "Configuration Error",
            "An API key is required for the magic to work. Set GEMINI_API_KEY or add api_key to the config file.",
        ),
        Locale::SimplifiedChinese => AnalysisResult::new(
            "配置错误",
            "请设置 GEMINI_API_KEY 或在配置文件中填入 api_key 才能使用魔法功能。",
        ),
    }
}

/// Result shown when the captioning service fails in any other way
pub fn fault_fallback(locale: Locale) -> AnalysisResult {
    match locale {
        Locale::English => AnalysisResult::new(
            "Detected Fault",
            "The camera sensor was overwhelmed by this image's energy.",
        ),
        Locale::SimplifiedChinese => {
            AnalysisResult::new("检测到故障", "相机传感器被这张图片的能量淹没了。")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_fallbacks() {
        assert_eq!(configuration_fallback(Locale::English).title, "Configuration Error");
        assert_eq!(fault_fallback(Locale::English).title, "Detected Fault");
    }

    #[test]
    fn test_prompts_ask_for_json_in_locale() {
        assert!(prompt_for(Locale::English).contains("Return JSON"));
        assert!(prompt_for(Locale::SimplifiedChinese).contains("请用中文回答"));
    }
}
