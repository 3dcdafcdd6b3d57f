//! The builtin prompt-engineering course content.
//!
//! Content lives in code rather than in data files so each exercise can
//! carry its validation strategy alongside its text. Every reference
//! solution here must pass its own rule; the tests at the bottom enforce
//! that for the whole catalog.

use crate::catalog::{Difficulty, Exercise, Lesson, Tutorial, WorkedExample};
use crate::error::Result;
use crate::validate::{Requirement, ValidationRule, Verdict};

/// Builds the tutorials of the shipped catalog.
pub(crate) fn builtin_tutorials() -> Result<Vec<Tutorial>> {
    Ok(vec![prompt_foundations()?, structured_agents()?])
}

// ============================================================================
// Tutorial: Prompt Engineering Foundations
// ============================================================================

fn prompt_foundations() -> Result<Tutorial> {
    Ok(Tutorial {
        id: "prompt-foundations".to_string(),
        title: "Prompt Engineering Foundations".to_string(),
        description: "Write instructions a model can actually follow: specificity, format \
                      constraints, roles, and examples."
            .to_string(),
        difficulty: Difficulty::Beginner,
        duration_minutes: 45,
        lessons: vec![
            clear_instructions()?,
            role_prompting()?,
            few_shot_examples()?,
        ],
    })
}

fn clear_instructions() -> Result<Lesson> {
    Ok(Lesson {
        id: "clear-instructions".to_string(),
        title: "Clear Instructions".to_string(),
        description: "Replace vague asks with explicit process and format requirements."
            .to_string(),
        duration_minutes: 15,
        concepts: vec![
            "specificity".to_string(),
            "process hints".to_string(),
            "format constraints".to_string(),
        ],
        theory: "Models do what you say, not what you mean. A vague prompt like \
                 'summarize this' leaves the model to guess the length, structure, and \
                 audience of the answer. Spell out the process you want it to follow \
                 ('work step by step') and the shape of the output ('a numbered list of \
                 three findings'), and the guessing disappears."
            .to_string(),
        examples: vec![WorkedExample {
            title: "Vague vs. specific".to_string(),
            code: "Read the incident report below. Work through it step by step, then \
                   summarize the root cause and the fix as a numbered list with one \
                   sentence per item."
                .to_string(),
            commentary: "The rewrite names a process (step by step), a structure (numbered \
                         list), and a length (one sentence per item). Any model, any day, \
                         produces roughly the same answer."
                .to_string(),
        }],
        exercises: vec![
            Exercise {
                id: "sharpen-a-summary".to_string(),
                title: "Sharpen a Summary Prompt".to_string(),
                description: "Rewrite the prompt 'summarize this report' so that the model \
                              works through the report methodically and returns a \
                              predictable structure."
                    .to_string(),
                starter_code: "Summarize this report.\n\n{report}".to_string(),
                solution: "Read the report below. Work through it step by step, then \
                           summarize the three key findings as a numbered list written \
                           for a non-technical audience.\n\n{report}"
                    .to_string(),
                hints: vec![
                    "Tell the model how to work, not just what to produce.".to_string(),
                    "Ask it to go step by step, and name the output structure you want."
                        .to_string(),
                ],
                rule: ValidationRule::all(
                    vec![
                        Requirement::contains(
                            "step by step",
                            "Ask the model to work through the report step by step.",
                        ),
                        Requirement::matches(
                            r"(?i)numbered list|bullet",
                            "Name the output structure: ask for a numbered or bulleted list.",
                        )?,
                    ],
                    "Good rewrite - the model now knows both how to read and how to answer.",
                ),
            },
            Exercise {
                id: "constrain-the-format".to_string(),
                title: "Constrain the Format".to_string(),
                description: "Write a prompt that asks for a product description with a hard \
                              length limit the model cannot misread."
                    .to_string(),
                starter_code: "Describe our new feature.".to_string(),
                solution: "Describe our new feature in exactly three sentences of at most \
                           twenty words each, with no marketing buzzwords."
                    .to_string(),
                hints: vec![
                    "Soft asks like 'keep it short' are read differently by every model."
                        .to_string(),
                    "Use a hard limit: 'at most', 'no more than', or 'exactly', plus the unit."
                        .to_string(),
                ],
                rule: ValidationRule::all(
                    vec![
                        Requirement::matches(
                            r"(?i)at most|no more than|exactly",
                            "Give the model a hard limit: 'at most', 'no more than', or 'exactly'.",
                        )?,
                        Requirement::matches(
                            r"(?i)sentences?|words?|characters?",
                            "Spell out the unit of the limit: sentences, words, or characters.",
                        )?,
                    ],
                    "Nice - that limit is unambiguous.",
                ),
            },
        ],
        prerequisites: vec![],
    })
}

fn role_prompting() -> Result<Lesson> {
    Ok(Lesson {
        id: "role-prompting".to_string(),
        title: "Role Prompting".to_string(),
        description: "Set who the model is and who it is talking to.".to_string(),
        duration_minutes: 15,
        concepts: vec!["personas".to_string(), "audience".to_string()],
        theory: "A role compresses a pile of style instructions into one sentence. 'You \
                 are a senior support engineer' implies tone, vocabulary, and depth that \
                 would take a paragraph to enumerate. Pair the role with an explicit \
                 audience so the model knows not just how to speak, but to whom."
            .to_string(),
        examples: vec![WorkedExample {
            title: "Role plus audience".to_string(),
            code: "You are a pediatric nurse. Explain the vaccination schedule to an \
                   audience of first-time parents in plain, reassuring language."
                .to_string(),
            commentary: "The role sets expertise and tone; the audience sets the level of \
                         detail. Dropping either half makes the output drift."
                .to_string(),
        }],
        exercises: vec![Exercise {
            id: "assign-a-role".to_string(),
            title: "Assign a Role".to_string(),
            description: "Write a prompt that makes the model explain a failed deployment. \
                          Give the model an expert role and name the audience the \
                          explanation is for."
                .to_string(),
            starter_code: "Explain why the deploy failed.".to_string(),
            solution: "You are a senior site reliability engineer. Explain why last \
                       night's deploy failed to an audience of new hires, avoiding \
                       internal jargon."
                .to_string(),
            hints: vec![
                "Open with 'You are ...' to set the role.".to_string(),
                "Say who will read the answer - the audience changes everything.".to_string(),
            ],
            rule: ValidationRule::all(
                vec![
                    Requirement::matches(
                        r"(?i)you are",
                        "Open by telling the model who it is: 'You are ...'.",
                    )?,
                    Requirement::contains(
                        "audience",
                        "Name the audience the answer is written for.",
                    ),
                ],
                "Exactly - role plus audience pins down tone and depth.",
            ),
        }],
        prerequisites: vec!["clear-instructions".to_string()],
    })
}

fn few_shot_examples() -> Result<Lesson> {
    Ok(Lesson {
        id: "few-shot-examples".to_string(),
        title: "Few-Shot Examples".to_string(),
        description: "Show the pattern instead of describing it.".to_string(),
        duration_minutes: 15,
        concepts: vec!["few-shot prompting".to_string(), "input/output pairs".to_string()],
        theory: "When a format is easier to show than to describe, show it. Two or three \
                 input/output pairs teach a model a labeling scheme, a rewrite style, or \
                 an extraction format more reliably than a paragraph of rules. End the \
                 prompt with the real input and an empty output slot for the model to \
                 fill."
            .to_string(),
        examples: vec![WorkedExample {
            title: "Two-shot classification".to_string(),
            code: "Input: I love this!\nOutput: positive\n\nInput: This is broken again.\n\
                   Output: negative\n\nInput: {message}\nOutput:"
                .to_string(),
            commentary: "The pairs define the label set and the casing; the trailing \
                         'Output:' tells the model exactly where to continue."
                .to_string(),
        }],
        exercises: vec![Exercise {
            id: "add-two-examples".to_string(),
            title: "Add Two Examples".to_string(),
            description: "Write a sentiment-classification prompt that teaches the format \
                          with at least two worked input/output pairs before the real \
                          input."
                .to_string(),
            starter_code: "Classify the sentiment of this message: {message}".to_string(),
            solution: "Classify the sentiment of each message as positive or negative.\n\n\
                       Input: I love this!\nOutput: positive\n\n\
                       Input: This is broken again.\nOutput: negative\n\n\
                       Input: {message}\nOutput:"
                .to_string(),
            hints: vec![
                "Use the literal labels 'Input:' and 'Output:' for each pair.".to_string(),
                "Two pairs is the minimum for the model to see a pattern rather than a \
                 one-off."
                    .to_string(),
            ],
            rule: ValidationRule::all(
                vec![Requirement::matches(
                    r"(?is)input:.*output:.*input:.*output:",
                    "Provide at least two input/output example pairs (label them 'Input:' \
                     and 'Output:').",
                )?],
                "That's few-shot prompting - the pattern is now unmistakable.",
            ),
        }],
        prerequisites: vec!["role-prompting".to_string()],
    })
}

// ============================================================================
// Tutorial: Building Structured Agents
// ============================================================================

fn structured_agents() -> Result<Tutorial> {
    Ok(Tutorial {
        id: "structured-agents".to_string(),
        title: "Building Structured Agents".to_string(),
        description: "Get machine-readable output and well-specified tools out of a model."
            .to_string(),
        difficulty: Difficulty::Intermediate,
        duration_minutes: 60,
        lessons: vec![output_contracts()?, tool_calling()?],
    })
}

fn output_contracts() -> Result<Lesson> {
    Ok(Lesson {
        id: "output-contracts".to_string(),
        title: "Output Contracts".to_string(),
        description: "Pin the response to a schema your code can parse.".to_string(),
        duration_minutes: 25,
        concepts: vec![
            "structured output".to_string(),
            "JSON schemas".to_string(),
            "parseability".to_string(),
        ],
        theory: "Code that consumes model output needs a contract, not prose. State that \
                 the reply must be JSON, show the exact keys and their types, and forbid \
                 anything outside the JSON. The difference between 'respond in JSON' and \
                 a shown schema is the difference between parsing sometimes and parsing \
                 always."
            .to_string(),
        examples: vec![WorkedExample {
            title: "A shown schema".to_string(),
            code: "Extract the order details. Respond with JSON only, nothing else:\n\
                   {\"customer\": string, \"items\": [string], \"total_cents\": number}"
                .to_string(),
            commentary: "The schema names every key; 'JSON only, nothing else' keeps \
                         markdown fences and apologies out of the reply."
                .to_string(),
        }],
        exercises: vec![Exercise {
            id: "request-json".to_string(),
            title: "Request JSON Output".to_string(),
            description: "Write a prompt that extracts meeting details (title, date, \
                          attendees) as JSON your code can parse on the first try."
                .to_string(),
            starter_code: "Extract the meeting details from this email:\n\n{email}"
                .to_string(),
            solution: "Extract the meeting details from the email below and respond with \
                       JSON only, nothing else:\n\
                       {\"title\": string, \"date\": string, \"attendees\": [string]}\n\n\
                       {email}"
                .to_string(),
            hints: vec![
                "Say the word JSON - and then show the schema, don't describe it.".to_string(),
                "Quote the exact keys you expect, like \"title\".".to_string(),
                "Forbid prose around the JSON or you'll get markdown fences.".to_string(),
            ],
            rule: ValidationRule::all(
                vec![
                    Requirement::contains("json", "Tell the model the reply must be JSON."),
                    Requirement::matches(
                        r#""[A-Za-z_]+""#,
                        "Show the exact keys you expect, quoted, e.g. \"title\".",
                    )?,
                    Requirement::matches(
                        r"(?i)only|nothing else|no prose",
                        "Forbid prose around the JSON ('JSON only, nothing else') so the \
                         reply stays parseable.",
                    )?,
                ],
                "That contract will parse on the first try.",
            ),
        }],
        prerequisites: vec![],
    })
}

fn tool_calling() -> Result<Lesson> {
    Ok(Lesson {
        id: "tool-calling".to_string(),
        title: "Describing Tools".to_string(),
        description: "Specify a tool so the model knows when and how to call it.".to_string(),
        duration_minutes: 35,
        concepts: vec![
            "tool use".to_string(),
            "function calling".to_string(),
            "argument schemas".to_string(),
        ],
        theory: "A tool description is a tiny API document the model reads under time \
                 pressure. It needs three things: what the tool does, when to reach for \
                 it, and the arguments it takes with their formats. Leave out the 'when' \
                 and the model calls it for everything; leave out argument formats and it \
                 invents its own."
            .to_string(),
        examples: vec![WorkedExample {
            title: "A complete tool description".to_string(),
            code: "get_weather: current conditions for a city.\n\
                   When to use: the user asks about weather right now.\n\
                   Arguments: city (name, not coordinates), units ('metric' or 'imperial')."
                .to_string(),
            commentary: "One line each for purpose, trigger, and arguments. The argument \
                         formats are spelled out so the model never guesses."
                .to_string(),
        }],
        exercises: vec![Exercise {
            id: "describe-a-tool".to_string(),
            title: "Describe a Tool".to_string(),
            description: "Write the description for a flight-search tool: what it does, \
                          when the model should use it, and the arguments it accepts."
                .to_string(),
            starter_code: "search_flights: searches flights.".to_string(),
            solution: "search_flights: look up available flights between two airports.\n\
                       When to use: the user asks about flight availability, times, or \
                       prices.\n\
                       Arguments: origin (IATA code), destination (IATA code), date \
                       (YYYY-MM-DD)."
                .to_string(),
            hints: vec![
                "Structure it as three parts: purpose, when to use, arguments.".to_string(),
                "Spell out argument formats (IATA code, YYYY-MM-DD) so the model never \
                 guesses."
                    .to_string(),
            ],
            // Three-part structure is easier to check as a predicate than as
            // containment: the line-count condition has no literal marker.
            rule: ValidationRule::custom(|submission| {
                let lines = submission.lines().filter(|l| !l.trim().is_empty()).count();
                if lines < 3 {
                    return Verdict::fail(
                        "Structure the description as three parts on separate lines: \
                         purpose, when to use it, and arguments.",
                    );
                }
                let lowered = submission.to_lowercase();
                if !lowered.contains("when") {
                    return Verdict::fail(
                        "Describe when the model should reach for this tool.",
                    );
                }
                if !lowered.contains("arguments") && !lowered.contains("parameters") {
                    return Verdict::fail(
                        "List the arguments the tool accepts, with their formats.",
                    );
                }
                Verdict::pass(
                    "Complete: purpose, trigger, and arguments - the model has everything \
                     it needs.",
                )
            }),
        }],
        prerequisites: vec!["output-contracts".to_string()],
    })
}
