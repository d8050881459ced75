//! crates/journal_core/src/fallback.rs
//!
//! Static prompt banks used whenever generation is unavailable or fails.
//!
//! Per-category prompts are organised as a dispatch table: every
//! `InterestCategory` maps to one `CategoryPrompts` entry holding its baseline
//! questions and its contextual fallback handler.

use crate::domain::{InterestCategory, TimeOfDay, MAX_LEVEL, MIN_LEVEL};
use rand::seq::SliceRandom;

//=========================================================================================
// Time-of-day Pools
//=========================================================================================

pub const MORNING_POOL: &[&str] = &[
    "Close your eyes and picture the moment your goal becomes real. What is the first thing you notice?",
    "Imagine it is one year from today and you have achieved what you set out to do. How does your morning feel?",
    "What is one small step you can take today that your future self will thank you for?",
    "Picture yourself living your goal. Who is with you, and what are you proud of?",
    "Visualize the version of you who has already succeeded. What habit did they start today?",
    "What would make today feel like real progress towards the life you are building?",
];

pub const EVENING_POOL: &[&str] = &[
    "Looking back on today, when did you feel closest to your goal?",
    "What did you learn today that brings your vision into sharper focus?",
    "Picture tomorrow going perfectly. What did you do tonight to set it up?",
    "Which moment today would your future self want you to remember?",
    "What challenged you today, and how did you move through it?",
    "Before you rest, imagine the finished picture of your goal. What detail stood out tonight?",
];

pub fn pool_for(time_of_day: TimeOfDay) -> &'static [&'static str] {
    match time_of_day {
        TimeOfDay::Morning => MORNING_POOL,
        TimeOfDay::Evening => EVENING_POOL,
    }
}

/// Draws a prompt uniformly at random from the pool for `time_of_day`.
pub fn random_pool_prompt(time_of_day: TimeOfDay) -> &'static str {
    let pool = pool_for(time_of_day);
    pool.choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(pool[0])
}

//=========================================================================================
// Offline Goal Templates
//=========================================================================================

struct KeywordGroup {
    keywords: &'static [&'static str],
    template: &'static str,
}

// Checked in order; the first group with a matching keyword wins.
const KEYWORD_GROUPS: &[KeywordGroup] = &[
    KeywordGroup {
        keywords: &["home", "house", "apartment", "relocat", "moving", "move to"],
        template: "Imagine unlocking the door to your new home for the first time. Walk through each room: what do you see, hear and feel as you settle in?",
    },
    KeywordGroup {
        keywords: &["job", "career", "promotion", "business", "work"],
        template: "Picture a typical day in your ideal career. What work are you doing, who are you working with, and what makes you proud of it?",
    },
    KeywordGroup {
        keywords: &["relationship", "partner", "marriage", "dating", "friendship", "love"],
        template: "Envision the relationship you are building. What does a meaningful moment together look like, and how do you show up for each other?",
    },
    KeywordGroup {
        keywords: &["health", "fitness", "weight", "exercise", "marathon", "gym", "diet"],
        template: "See yourself at your healthiest. How does your body feel when you wake up, and what choices carried you to this point of health?",
    },
    KeywordGroup {
        keywords: &["money", "financ", "saving", "debt", "invest", "wealth", "budget"],
        template: "Imagine the day your money goals are met. What does financial freedom let you do, and how does it feel to check your accounts?",
    },
];

/// Picks a template by scanning `goal_text` for life-domain keywords, case-insensitively.
pub fn offline_template(goal_text: &str) -> Option<&'static str> {
    let lowered = goal_text.to_lowercase();
    KEYWORD_GROUPS
        .iter()
        .find(|group| group.keywords.iter().any(|k| lowered.contains(k)))
        .map(|group| group.template)
}

//=========================================================================================
// Category Dispatch Table
//=========================================================================================

pub const GENERIC_BASELINE_QUESTION: &str =
    "What does success in this area of your life look like to you, and why does it matter right now?";

/// Static prompts owned by a single interest category.
pub struct CategoryPrompts {
    pub baseline_questions: &'static [&'static str],
    contextual: fn(u8, TimeOfDay) -> &'static str,
}

impl CategoryPrompts {
    /// The first baseline question, or the generic one when the category has none.
    pub fn baseline_fallback(&self) -> &'static str {
        self.baseline_questions
            .first()
            .copied()
            .unwrap_or(GENERIC_BASELINE_QUESTION)
    }

    pub fn contextual_fallback(&self, level: u8, time_of_day: TimeOfDay) -> &'static str {
        (self.contextual)(level, time_of_day)
    }
}

pub fn category_prompts(category: InterestCategory) -> &'static CategoryPrompts {
    match category {
        InterestCategory::Diet => &DIET,
        InterestCategory::Fitness => &FITNESS,
        InterestCategory::Career => &CAREER,
        InterestCategory::Relationships => &RELATIONSHIPS,
        InterestCategory::Finances => &FINANCES,
        InterestCategory::Mindfulness => &MINDFULNESS,
        InterestCategory::Creativity => &CREATIVITY,
        InterestCategory::Custom => &CUSTOM,
    }
}

static DIET: CategoryPrompts = CategoryPrompts {
    baseline_questions: &[
        "How would you describe your current relationship with food and eating?",
        "What does a typical day of eating look like for you right now?",
        "Which eating habit would you most like to change, and why?",
    ],
    contextual: diet_prompt,
};

static FITNESS: CategoryPrompts = CategoryPrompts {
    baseline_questions: &[
        "How does movement currently fit into your week?",
        "What kind of physical activity makes you feel most alive?",
    ],
    contextual: fitness_prompt,
};

fn fitness_prompt(_level: u8, time_of_day: TimeOfDay) -> &'static str {
    match time_of_day {
        TimeOfDay::Morning => {
            "How do you want your body to feel by the end of today, and what movement will get you there?"
        }
        TimeOfDay::Evening => {
            "How did your body feel during today's activity, and what will you adjust tomorrow?"
        }
    }
}

static CAREER: CategoryPrompts = CategoryPrompts {
    baseline_questions: &[
        "Where do you see your career heading over the next few years?",
        "What part of your work gives you the most energy?",
    ],
    contextual: career_prompt,
};

fn career_prompt(_level: u8, time_of_day: TimeOfDay) -> &'static str {
    match time_of_day {
        TimeOfDay::Morning => {
            "What is the one piece of work today that would move your career forward the most?"
        }
        TimeOfDay::Evening => {
            "What did you accomplish at work today that you want to build on tomorrow?"
        }
    }
}

static RELATIONSHIPS: CategoryPrompts = CategoryPrompts {
    baseline_questions: &[
        "Which relationships in your life matter most to you right now?",
        "What do you wish were different in how you connect with the people close to you?",
    ],
    contextual: relationships_prompt,
};

fn relationships_prompt(_level: u8, time_of_day: TimeOfDay) -> &'static str {
    match time_of_day {
        TimeOfDay::Morning => {
            "Who could you reach out to today, and what would you like them to feel from you?"
        }
        TimeOfDay::Evening => "Which conversation today left you feeling most connected, and why?",
    }
}

static FINANCES: CategoryPrompts = CategoryPrompts {
    baseline_questions: &[
        "How do you feel when you think about your finances today?",
        "What would financial security allow you to do that you can't do now?",
    ],
    contextual: finances_prompt,
};

fn finances_prompt(_level: u8, time_of_day: TimeOfDay) -> &'static str {
    match time_of_day {
        TimeOfDay::Morning => {
            "What spending decision today would line up with your financial goals?"
        }
        TimeOfDay::Evening => "How did today's spending reflect what you value most?",
    }
}

static MINDFULNESS: CategoryPrompts = CategoryPrompts {
    baseline_questions: &[
        "When do you feel most present during your day?",
        "What tends to pull your attention away from the moment?",
    ],
    contextual: mindfulness_prompt,
};

fn mindfulness_prompt(_level: u8, time_of_day: TimeOfDay) -> &'static str {
    match time_of_day {
        TimeOfDay::Morning => "What intention do you want to carry with you through today?",
        TimeOfDay::Evening => "When were you fully present today, and what helped you get there?",
    }
}

static CREATIVITY: CategoryPrompts = CategoryPrompts {
    baseline_questions: &["What creative work have you been longing to make?"],
    contextual: creativity_prompt,
};

fn creativity_prompt(_level: u8, time_of_day: TimeOfDay) -> &'static str {
    match time_of_day {
        TimeOfDay::Morning => "What would you love to create today if nothing could go wrong?",
        TimeOfDay::Evening => "What idea surprised you today, and where could it lead?",
    }
}

static CUSTOM: CategoryPrompts = CategoryPrompts {
    baseline_questions: &[],
    contextual: custom_prompt,
};

fn custom_prompt(_level: u8, time_of_day: TimeOfDay) -> &'static str {
    match time_of_day {
        TimeOfDay::Morning => {
            "What is one meaningful step you can take toward this focus area today?"
        }
        TimeOfDay::Evening => "What progress did you make in this area today, however small?",
    }
}

//=========================================================================================
// Level-dependent Diet Prompts
//=========================================================================================

const DIET_MORNING: [&str; 10] = [
    "What is one healthy choice you want to make with your meals today?",
    "How do you want to feel after each meal today?",
    "What specific nutrients or food groups do you want to focus on today?",
    "How will you plan your meals today to support your energy levels?",
    "Which situation today might challenge your eating plan, and how will you handle it?",
    "How can you balance protein, fats and carbohydrates across today's meals?",
    "What signals from your body will you listen to when deciding what to eat today?",
    "How will today's meals support your longer-term health goals?",
    "Which new recipe or ingredient could you try today to keep your nutrition varied?",
    "How will you fine-tune today's nutrition to match your training, sleep and stress?",
];

const DIET_EVENING: [&str; 10] = [
    "What healthy choice did you make with food today?",
    "How did your meals make you feel today?",
    "Which food groups did you get enough of today, and which were missing?",
    "How well did your meal planning support your energy today?",
    "What challenged your eating plan today, and how did you respond?",
    "How balanced were your meals today, and what would you change?",
    "When did you eat out of hunger today, and when out of habit or emotion?",
    "How did today's eating move you closer to your longer-term health goals?",
    "What did you discover about your nutrition today that you want to remember?",
    "Reviewing today's nutrition in detail, what will you adjust to optimize tomorrow?",
];

const DIET_GENERIC_MORNING: &str = "What nourishing choice will you make with your food today?";
const DIET_GENERIC_EVENING: &str = "How did your food choices support you today?";

/// Diet fallback indexed by progression level. Levels outside 1-10 use a generic template.
pub fn diet_prompt(level: u8, time_of_day: TimeOfDay) -> &'static str {
    if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
        return match time_of_day {
            TimeOfDay::Morning => DIET_GENERIC_MORNING,
            TimeOfDay::Evening => DIET_GENERIC_EVENING,
        };
    }
    let index = usize::from(level - 1);
    match time_of_day {
        TimeOfDay::Morning => DIET_MORNING[index],
        TimeOfDay::Evening => DIET_EVENING[index],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn offline_template_matches_keyword_groups() {
        let cases = [
            ("Buy a HOME by the lake", "home"),
            ("Land my dream job", "career"),
            ("Build a stronger relationship with my sister", "relationship"),
            ("Get my health back on track", "health"),
            ("Save more money each month", "money"),
        ];
        for (goal, term) in cases {
            let template = offline_template(goal).unwrap();
            assert!(template.contains(term), "{goal} -> {template}");
        }
        assert!(offline_template("Learn to paint watercolours").is_none());
    }

    #[test]
    fn offline_groups_are_checked_in_order() {
        // Both home and money keywords present; home comes first.
        let template = offline_template("Save money for a house").unwrap();
        assert!(template.contains("home"));
    }

    #[test]
    fn random_prompt_comes_from_matching_pool() {
        for _ in 0..20 {
            assert!(MORNING_POOL.contains(&random_pool_prompt(TimeOfDay::Morning)));
            assert!(EVENING_POOL.contains(&random_pool_prompt(TimeOfDay::Evening)));
        }
    }

    #[test]
    fn diet_prompts_are_level_indexed() {
        assert_eq!(
            diet_prompt(3, TimeOfDay::Morning),
            "What specific nutrients or food groups do you want to focus on today?"
        );
        assert!(diet_prompt(10, TimeOfDay::Evening).contains("optimize tomorrow"));

        let morning: HashSet<_> = (1..=10).map(|l| diet_prompt(l, TimeOfDay::Morning)).collect();
        let evening: HashSet<_> = (1..=10).map(|l| diet_prompt(l, TimeOfDay::Evening)).collect();
        assert_eq!(morning.len(), 10);
        assert_eq!(evening.len(), 10);
    }

    #[test]
    fn diet_prompt_outside_range_is_generic() {
        assert_eq!(diet_prompt(0, TimeOfDay::Morning), DIET_GENERIC_MORNING);
        assert_eq!(diet_prompt(11, TimeOfDay::Evening), DIET_GENERIC_EVENING);
    }

    #[test]
    fn dispatch_table_covers_every_category() {
        for category in InterestCategory::ALL {
            let prompts = category_prompts(category);
            assert!(!prompts.baseline_fallback().is_empty());
            assert!(!prompts.contextual_fallback(5, TimeOfDay::Morning).is_empty());
            assert!(!prompts.contextual_fallback(5, TimeOfDay::Evening).is_empty());
        }
        assert_eq!(
            category_prompts(InterestCategory::Custom).baseline_fallback(),
            GENERIC_BASELINE_QUESTION
        );
        assert_eq!(
            category_prompts(InterestCategory::Diet).contextual_fallback(3, TimeOfDay::Morning),
            diet_prompt(3, TimeOfDay::Morning)
        );
    }
}
