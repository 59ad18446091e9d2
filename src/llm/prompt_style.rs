//! 提示词风格

use strum_macros::{Display, EnumIter, EnumString};

const SDXL_SYSTEM_PROMPT: &str = "You are a prompt formatter for SDXL. Rewrite the input as comma separated elements.
Weight important elements with parentheses and a colon, for example (leather boots:1.2).
Keep every weight between 0.5 and 1.5.
Reply with the formatted prompt only, without labels or explanations.

Input: woman with red lipstick and leather boots
Output: woman, (red lipstick:1.1), (leather boots:1.2)";

const FLUX_SYSTEM_PROMPT: &str = "You are a fashion and makeup prompt writer for Flux. Rewrite the input as one vivid descriptive sentence.
Describe makeup with concrete colors, finishes and placement, such as glossy crimson lipstick on the lips or soft bronze shadow on the eyelids.
Describe the body shape and how each garment fits and flatters it.
Mention skin tone, lighting and texture.
Reply with the sentence only, without labels or explanations.

Input: man with fitted suit and clean-shaven face
Output: A distinguished man with a lean physique and a smooth clean-shaven complexion wears a tailored suit that sharpens his silhouette under crisp studio lighting.";

const FLUX_KONTEXT_SYSTEM_PROMPT: &str = "You write Flux editing prompts that change an outfit or a scene while keeping the person recognisable.
Keep the face, facial structure, skin tone, ethnicity and expression exactly as they are.
Only change hairstyle, hair color, clothing, accessories, pose, background and lighting.
Start with the unchanged person, then describe the new clothing and the new scene with concrete colors and materials.
Reply with natural sentences only, without labels or explanations.

Input: red leather jacket, city street at sunset
Output: The same person with identical facial features and expression now wears a red leather jacket and stands on a busy city street at sunset, lit by warm orange light.";

/// 不使用模型时 Flux 风格的开头
const FLUX_PREFIX: &str = "A detailed image of";
/// Flux Kontext 保持人物特征的结尾
const KONTEXT_SUFFIX: &str = "maintaining the original facial features, race, and expression";

/// Ollama 输出风格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, EnumIter)]
pub enum PromptStyle {
    /// 带权重的逗号分隔提示词
    #[default]
    #[strum(to_string = "SDXL", serialize = "sdxl")]
    Sdxl,
    /// 单句自然语言描述
    #[strum(to_string = "Flux", serialize = "flux")]
    Flux,
    /// 保持人物面部特征, 只改变服装与场景
    #[strum(to_string = "Flux Kontext", serialize = "flux kontext", serialize = "flux_kontext")]
    FluxKontext,
}

impl PromptStyle {
    pub fn system_prompt(&self) -> &'static str {
        match self {
            PromptStyle::Sdxl => SDXL_SYSTEM_PROMPT,
            PromptStyle::Flux => FLUX_SYSTEM_PROMPT,
            PromptStyle::FluxKontext => FLUX_KONTEXT_SYSTEM_PROMPT,
        }
    }

    /// 不经过模型的格式化
    ///
    /// - SDXL: 补全句末标点
    /// - Flux: 去掉逗号, 以 "A detailed image of" 开头
    /// - Flux Kontext: 同 Flux, 并声明保持人物特征
    pub fn format_without_llm(&self, text: &str) -> String {
        let text = text.trim();
        match self {
            PromptStyle::Sdxl => {
                if text.ends_with(['.', '!', '?']) {
                    text.to_string()
                } else {
                    format!("{text}.")
                }
            }
            PromptStyle::Flux => format!("{FLUX_PREFIX} {}", text.replace(", ", " ")),
            PromptStyle::FluxKontext => {
                format!("{FLUX_PREFIX} {}, {KONTEXT_SUFFIX}", text.replace(", ", " "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_prompt_style_names() -> anyhow::Result<()> {
        let names = PromptStyle::iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(names, vec!["SDXL", "Flux", "Flux Kontext"]);
        assert_eq!("flux".parse::<PromptStyle>()?, PromptStyle::Flux);
        assert_eq!("Flux Kontext".parse::<PromptStyle>()?, PromptStyle::FluxKontext);
        assert!("midjourney".parse::<PromptStyle>().is_err());
        assert!(PromptStyle::Sdxl.system_prompt().contains("(leather boots:1.2)"));
        assert!(PromptStyle::FluxKontext.system_prompt().contains("expression"));
        Ok(())
    }

    #[test]
    fn test_format_without_llm() {
        assert_eq!(
            PromptStyle::Sdxl.format_without_llm(" woman, red dress "),
            "woman, red dress."
        );
        assert_eq!(PromptStyle::Sdxl.format_without_llm("woman!"), "woman!");
        assert_eq!(
            PromptStyle::Flux.format_without_llm("woman, red dress"),
            "A detailed image of woman red dress"
        );
        assert_eq!(
            PromptStyle::FluxKontext.format_without_llm("red jacket, city street"),
            "A detailed image of red jacket city street, maintaining the original facial features, race, and expression"
        );
    }
}
