use std::thread;
use std::time::Duration;
use thiserror::Error;

const FACTORIAL_TEMPLATE: &str = include_str!("templates/factorial.py");
const CALCULATOR_TEMPLATE: &str = include_str!("templates/calculator.py");
const SORTING_TEMPLATE: &str = include_str!("templates/sorting.py");
const WEB_TEMPLATE: &str = include_str!("templates/web.py");
const GUI_TEMPLATE: &str = include_str!("templates/gui.py");
const GENERAL_TEMPLATE: &str = include_str!("templates/general.py");

const PROMPT_PLACEHOLDER: &str = "{prompt}";

pub const DEFAULT_THINK_DELAY: Duration = Duration::from_millis(2500);

/// A keyword bucket mapped to one fixed template body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: &'static str,
    pub keywords: &'static [&'static str],
    pub template: &'static str,
}

impl Category {
    /// `lowered` must already be lowercased.
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|keyword| lowered.contains(keyword))
    }
}

/// Built-in categories in priority order.
pub fn builtin_categories() -> Vec<Category> {
    vec![
        Category {
            id: "factorial",
            keywords: &["factorial", "факториал"],
            template: FACTORIAL_TEMPLATE,
        },
        Category {
            id: "calculator",
            keywords: &["calculator", "calc", "калькулятор"],
            template: CALCULATOR_TEMPLATE,
        },
        Category {
            id: "sorting",
            keywords: &["sort", "сортиров"],
            template: SORTING_TEMPLATE,
        },
        Category {
            id: "web",
            keywords: &["web", "scraping", "парсинг"],
            template: WEB_TEMPLATE,
        },
        Category {
            id: "gui",
            keywords: &["gui", "interface", "интерфейс"],
            template: GUI_TEMPLATE,
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("prompt is empty")]
    EmptyPrompt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub id: u64,
    pub prompt: String,
    pub deep_think: bool,
}

impl GenerationRequest {
    pub fn new(id: u64, prompt: impl Into<String>, deep_think: bool) -> Result<Self, RequestError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(RequestError::EmptyPrompt);
        }
        Ok(Self {
            id,
            prompt,
            deep_think,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// `None` when the generic template was used.
    pub category: Option<&'static str>,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct TemplateDispatcher {
    categories: Vec<Category>,
    think_delay: Duration,
}

impl Default for TemplateDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_THINK_DELAY)
    }
}

impl TemplateDispatcher {
    pub fn new(think_delay: Duration) -> Self {
        Self::with_categories(builtin_categories(), think_delay)
    }

    pub fn with_categories(categories: Vec<Category>, think_delay: Duration) -> Self {
        Self {
            categories,
            think_delay,
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn think_delay(&self) -> Duration {
        self.think_delay
    }

    pub fn classify(&self, prompt: &str) -> Option<&Category> {
        let lowered = prompt.to_lowercase();
        self.categories
            .iter()
            .find(|category| category.matches(&lowered))
    }

    /// Blocks the calling thread for the think delay when `deep_think` is set.
    pub fn dispatch(&self, prompt: &str, deep_think: bool) -> String {
        self.resolve(prompt, deep_think).code
    }

    /// Same as [`dispatch`](Self::dispatch), also reporting the matched category.
    pub fn generate(&self, request: &GenerationRequest) -> Generation {
        self.resolve(&request.prompt, request.deep_think)
    }

    fn resolve(&self, prompt: &str, deep_think: bool) -> Generation {
        if deep_think && !self.think_delay.is_zero() {
            thread::sleep(self.think_delay);
        }

        match self.classify(prompt) {
            Some(category) => Generation {
                category: Some(category.id),
                code: category.template.to_string(),
            },
            None => Generation {
                category: None,
                code: general_template(prompt),
            },
        }
    }
}

fn general_template(prompt: &str) -> String {
    GENERAL_TEMPLATE.replacen(PROMPT_PLACEHOLDER, prompt, 1)
}

#[cfg(test)]
mod tests {
    use super::{
        Category, GenerationRequest, RequestError, TemplateDispatcher, DEFAULT_THINK_DELAY,
    };
    use std::time::{Duration, Instant};

    fn instant_dispatcher() -> TemplateDispatcher {
        TemplateDispatcher::new(Duration::ZERO)
    }

    #[test]
    fn factorial_wins_over_later_categories() {
        let dispatcher = instant_dispatcher();
        let category = dispatcher
            .classify("FACTORIAL calculator with a GUI that can sort")
            .expect("factorial prompt should match");
        assert_eq!(category.id, "factorial");
        assert!(dispatcher
            .dispatch("Write a Factorial function", false)
            .contains("def factorial(n: int) -> int:"));
    }

    #[test]
    fn localized_keywords_match_case_insensitively() {
        let dispatcher = instant_dispatcher();
        assert_eq!(dispatcher.classify("ФАКТОРИАЛ числа").map(|c| c.id), Some("factorial"));
        assert_eq!(dispatcher.classify("Сортировка списка").map(|c| c.id), Some("sorting"));
        assert_eq!(dispatcher.classify("парсинг сайта").map(|c| c.id), Some("web"));
        assert_eq!(dispatcher.classify("простой интерфейс").map(|c| c.id), Some("gui"));
    }

    #[test]
    fn priority_order_follows_table() {
        let dispatcher = instant_dispatcher();
        assert_eq!(dispatcher.classify("calc that can sort").map(|c| c.id), Some("calculator"));
        assert_eq!(dispatcher.classify("sort results from web").map(|c| c.id), Some("sorting"));
        assert_eq!(dispatcher.classify("web interface").map(|c| c.id), Some("web"));
        assert_eq!(dispatcher.classify("desktop GUI").map(|c| c.id), Some("gui"));
    }

    #[test]
    fn calculator_prompt_selects_calculator_template() {
        let dispatcher = instant_dispatcher();
        let request = GenerationRequest::new(1, "write me a calculator", false)
            .expect("prompt should be valid");
        let generation = dispatcher.generate(&request);

        assert_eq!(generation.category, Some("calculator"));
        for operation in ["def add", "def subtract", "def multiply", "def divide"] {
            assert!(generation.code.contains(operation), "missing {operation}");
        }
        assert!(generation.code.contains("if b == 0:"));
    }

    #[test]
    fn unmatched_prompt_echoes_original_text() {
        let dispatcher = instant_dispatcher();
        let prompt = "Build a Telegram Bot for {weather}";
        let generation = dispatcher.generate(
            &GenerationRequest::new(7, prompt, false).expect("prompt should be valid"),
        );

        assert_eq!(generation.category, None);
        assert!(generation.code.starts_with("# Solution for: Build a Telegram Bot for {weather}\n"));
        assert!(generation.code.contains("def solution():"));
    }

    #[test]
    fn deep_think_changes_latency_only() {
        let delay = Duration::from_millis(60);
        let dispatcher = TemplateDispatcher::new(delay);

        let started = Instant::now();
        let quick = dispatcher.dispatch("sort a list", false);
        let quick_elapsed = started.elapsed();

        let started = Instant::now();
        let deep = dispatcher.dispatch("sort a list", true);
        let deep_elapsed = started.elapsed();

        assert_eq!(quick, deep);
        assert!(deep_elapsed >= delay);
        assert!(quick_elapsed < delay);
    }

    #[test]
    fn default_think_delay_is_two_and_a_half_seconds() {
        assert_eq!(TemplateDispatcher::default().think_delay(), DEFAULT_THINK_DELAY);
        assert_eq!(DEFAULT_THINK_DELAY, Duration::from_millis(2500));
    }

    #[test]
    fn blank_prompts_are_rejected_before_dispatch() {
        assert_eq!(
            GenerationRequest::new(1, "", false),
            Err(RequestError::EmptyPrompt)
        );
        assert_eq!(
            GenerationRequest::new(2, "   \t", true),
            Err(RequestError::EmptyPrompt)
        );
    }

    #[test]
    fn generated_category_and_code_come_from_one_match() {
        let dispatcher = instant_dispatcher();
        for category in dispatcher.categories() {
            let prompt = format!("please {}", category.keywords[0].to_uppercase());
            let generation = dispatcher.generate(
                &GenerationRequest::new(1, prompt.as_str(), false).expect("prompt should be valid"),
            );
            assert_eq!(generation.category, Some(category.id));
            assert_eq!(generation.code, category.template);
            assert_eq!(dispatcher.dispatch(&prompt, false), generation.code);
        }
    }

    #[test]
    fn custom_categories_are_a_data_change() {
        let mut categories = super::builtin_categories();
        categories.insert(
            0,
            Category {
                id: "hello",
                keywords: &["hello"],
                template: "print('hello')",
            },
        );
        let dispatcher = TemplateDispatcher::with_categories(categories, Duration::ZERO);

        assert_eq!(dispatcher.dispatch("hello factorial", false), "print('hello')");
        assert_eq!(dispatcher.categories().len(), 6);
    }
}
