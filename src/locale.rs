//! Locale profiles
//!
//! Everything that differs between personas and languages lives here as data:
//! stop words, contraction tables, keep-words, stemming suffixes and fallback
//! phrases. One generic engine consumes a profile.

use serde::{Deserialize, Serialize};

/// Configuration record consumed by the normalizer and the fallback path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleProfile {
    pub name: String,
    pub stop_words: Vec<String>,
    /// Short or stop-listed tokens that are still significant ("hi", "sad").
    pub keep_words: Vec<String>,
    /// Whole-word replacements applied after punctuation stripping.
    pub contractions: Vec<(String, String)>,
    /// Keyword suffixes, tried in order; the first that matches is stripped.
    pub suffixes: Vec<String>,
    /// Keywords shorter than this many characters are dropped.
    pub min_token_len: usize,
    pub strip_accents: bool,
    /// Emit per-character keywords for kana and CJK ideographs.
    pub segment_logographic: bool,
    pub fallbacks: Vec<String>,
}

impl Default for LocaleProfile {
    fn default() -> Self {
        Self::english()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

impl LocaleProfile {
    /// Look up a built-in profile by its short name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Self::english()),
            "fr" | "french" => Some(Self::french()),
            "it" | "italian" => Some(Self::italian()),
            "es" | "spanish" => Some(Self::spanish()),
            "zh" | "chinese" => Some(Self::chinese()),
            "ja" | "japanese" => Some(Self::japanese()),
            _ => None,
        }
    }

    pub fn english() -> Self {
        Self {
            name: "en".to_string(),
            stop_words: strings(&["a", "an", "the", "and", "or", "is", "are", "meow"]),
            keep_words: strings(&["hi", "hey", "yo", "sad", "bye", "no", "yes"]),
            contractions: pairs(&[
                ("won't", "will not"),
                ("can't", "cannot"),
                ("i'm", "i am"),
                ("you're", "you are"),
                ("it's", "it is"),
                ("that's", "that is"),
            ]),
            suffixes: strings(&["'s", "ing", "ed", "s"]),
            min_token_len: 3,
            strip_accents: true,
            segment_logographic: false,
            fallbacks: strings(&[
                "*tilts head* Meow? Could you say that differently?",
                "*tail flick* Nyaa~ Not sure I understand...",
                "*paws at air* Maybe try different words?",
                "*slow blink* Meow? Could you rephrase that?",
                "*ears droop* Nyaa~ I don't understand... try again?",
                "*curls tail* Maybe ask something else? (^・ω・^ )",
            ]),
        }
    }

    pub fn french() -> Self {
        Self {
            name: "fr".to_string(),
            stop_words: strings(&["un", "une", "le", "la", "et", "ou", "est", "sont", "miaou"]),
            keep_words: strings(&["oui", "non", "yo"]),
            contractions: pairs(&[
                ("n'ai", "ne ai"),
                ("n'est", "ne est"),
                ("j'ai", "je ai"),
                ("c'est", "ce est"),
                ("qu'est", "que est"),
            ]),
            suffixes: strings(&["ant", "ent", "er", "ir"]),
            min_token_len: 3,
            strip_accents: true,
            segment_logographic: false,
            fallbacks: strings(&[
                "*incline la tête* Miaou? Pourrais-tu le dire différemment?",
                "*remue la queue* Nyaa~ Je ne suis pas sûre de comprendre...",
                "*pattes dans l'air* Peut-être essayer avec d'autres mots?",
                "*clignement lent* Miaou? Pourrais-tu reformuler?",
                "*oreilles baissées* Nyaa~ Je ne comprends pas... essaie encore?",
            ]),
        }
    }

    pub fn italian() -> Self {
        Self {
            name: "it".to_string(),
            stop_words: strings(&["un", "una", "il", "la", "e", "o", "è", "sono", "miao"]),
            keep_words: strings(&["si", "no", "ciao"]),
            contractions: pairs(&[("c'è", "ci è"), ("l'ho", "lo ho"), ("com'è", "come è")]),
            suffixes: strings(&["are", "ere", "ire", "ando", "endo"]),
            min_token_len: 3,
            strip_accents: true,
            segment_logographic: false,
            fallbacks: strings(&[
                "*inclina la testa* Miao? Potresti dirlo diversamente?",
                "*muove la coda* Nyaa~ Non sono sicura di capire...",
                "*zampe in aria* Magari prova con altre parole?",
                "*occhi socchiusi* Miao? Potresti riformulare?",
            ]),
        }
    }

    pub fn spanish() -> Self {
        Self {
            name: "es".to_string(),
            stop_words: strings(&["un", "una", "el", "la", "y", "o", "es", "son", "miau"]),
            keep_words: strings(&["si", "no", "ey"]),
            contractions: pairs(&[("al", "a el"), ("del", "de el")]),
            suffixes: strings(&["ando", "iendo", "ar", "er", "ir"]),
            min_token_len: 3,
            strip_accents: true,
            segment_logographic: false,
            fallbacks: strings(&[
                "*inclina cabeza* ¿Miau? ¿Podrías decirlo de otra manera?",
                "*mueve cola* Nyaa~ No estoy segura de entender...",
                "*patea el aire* ¿Tal vez prueba con otras palabras?",
                "*parpadea lentamente* ¿Miau? ¿Podrías reformularlo?",
                "*orejas caídas* Nyaa~ No entiendo... ¿intentas de nuevo?",
            ]),
        }
    }

    pub fn chinese() -> Self {
        Self {
            name: "zh".to_string(),
            stop_words: strings(&["一个", "每个", "的", "了", "吗"]),
            keep_words: Vec::new(),
            contractions: Vec::new(),
            suffixes: strings(&["的"]),
            min_token_len: 1,
            strip_accents: false,
            segment_logographic: true,
            fallbacks: strings(&[
                "*抬头* 喵？能换个说法吗？",
                "*摇尾巴* 喵~ 不太明白...",
                "*拍空气* 可以试着用其他词吗？",
                "*慢慢眨眼* 喵？可以换个说法吗？",
                "*耳朵下垂* 喵~ 我不懂...再试一次？",
                "*卷尾巴* 可以问些其他问题吗？ (^・ω・^ )",
            ]),
        }
    }

    pub fn japanese() -> Self {
        Self {
            name: "ja".to_string(),
            stop_words: strings(&["は", "が", "を", "に", "の", "で", "と", "も", "ね", "よ"]),
            keep_words: Vec::new(),
            contractions: Vec::new(),
            suffixes: Vec::new(),
            min_token_len: 1,
            // Kana voicing marks decompose into combining characters.
            strip_accents: false,
            segment_logographic: true,
            fallbacks: strings(&[
                "ニャ？ よく分からないニャ〜 もう一度言ってみてニャ♪ (=^･ω･^=)",
                "難しい話ニャ〜 猫にも分かるように説明してほしいニャ♪ (*´∀｀*)",
                "ニャーン♪ 別の話をしてみるニャ〜 何か楽しいこと教えてニャ！ (◕ᴗ◕✿)",
                "首をかしげてしまうニャ〜 もう少し簡単に言ってもらえるかニャ？ ฅ(^◕ω◕^)ฅ",
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(LocaleProfile::builtin("EN").unwrap().name, "en");
        assert_eq!(LocaleProfile::builtin("japanese").unwrap().name, "ja");
        assert!(LocaleProfile::builtin("klingon").is_none());
    }

    #[test]
    fn test_every_builtin_has_fallbacks() {
        for name in ["en", "fr", "it", "es", "zh", "ja"] {
            let profile = LocaleProfile::builtin(name).unwrap();
            assert!(!profile.fallbacks.is_empty(), "{name} has no fallbacks");
        }
    }

    #[test]
    fn test_partial_profile_fills_defaults() {
        let profile: LocaleProfile =
            serde_json::from_str(r#"{"name":"custom","stop_words":["uh"]}"#).unwrap();
        assert_eq!(profile.name, "custom");
        assert_eq!(profile.stop_words, vec!["uh".to_string()]);
        assert_eq!(profile.min_token_len, 3);
        assert!(!profile.fallbacks.is_empty());
    }
}
