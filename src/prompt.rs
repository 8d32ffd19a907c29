use std::sync::LazyLock;

use regex::Regex;

const BASE_GUIDANCE: &str = "\n\nPlease ensure the answer is medium length, structured, and includes a short 'References' section with explicit Quran citations like SurahName Surah:Ayah and quran.com links. If unsure about counts, state uncertainty and provide representative verses and a search link.";

const FREQUENCY_CAVEAT: &str = "\nIf the query is about a word frequency, note that counts vary with Arabic morphology and translations. Provide an approximate count only if confident; otherwise, list 3–6 key verses with brief context and include https://quran.com/search?q={term}.";

const ENGLISH_CLOSING: &str = "\nRespond in English with clear, respectful, and simple language.";

const URDU_CLOSING: &str = "\nRespond in Urdu (اردو) with clear, respectful, and simple language.";

static COUNT_QUERY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(how many|count|kitni|kitne|times).*\b(word|ayat|verses?|mentions?|dafa|martaba)")
        .expect("count query pattern is valid")
});

static WORD_QUERY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(word|jhoot|lie|truth|mercy|rahmah|sabr|patience|forgive|maghfirah|shirk|tawbah|iman|kufr|جھوٹ|سچ|رحمت|صبر|ایمان)",
    )
    .expect("word query pattern is valid")
});

/// Language the answer should be written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lang {
    #[default]
    English,
    Urdu,
}

impl Lang {
    /// Only the exact tag `ur` selects Urdu; every other value, including
    /// none, differently cased or padded tags, is English.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("ur") => Self::Urdu,
            _ => Self::English,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Urdu => "ur",
        }
    }

    fn closing_instruction(&self) -> &'static str {
        match self {
            Self::English => ENGLISH_CLOSING,
            Self::Urdu => URDU_CLOSING,
        }
    }
}

pub fn looks_like_count_query(question: &str) -> bool {
    COUNT_QUERY.is_match(&question.to_lowercase())
}

pub fn looks_like_word_query(question: &str) -> bool {
    WORD_QUERY.is_match(&question.to_lowercase())
}

/// Appends the answer guidance to a user's question.
///
/// The trimmed question always comes first, followed by the general
/// guidance paragraph, the word-frequency caveat when the question reads
/// like a counting or term lookup, and the closing language instruction.
pub fn build_prompt(question: &str, lang: Lang) -> String {
    let question = question.trim();
    let mut prompt = String::with_capacity(
        question.len() + BASE_GUIDANCE.len() + FREQUENCY_CAVEAT.len() + URDU_CLOSING.len(),
    );
    prompt.push_str(question);
    prompt.push_str(BASE_GUIDANCE);

    if looks_like_count_query(question) || looks_like_word_query(question) {
        prompt.push_str(FREQUENCY_CAVEAT);
    }

    prompt.push_str(lang.closing_instruction());
    prompt
}
