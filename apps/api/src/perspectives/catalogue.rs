//! The ten fixed thinking-prompt templates, in catalogue order.
//!
//! Templates are reproduced verbatim; each has exactly one `{content}` slot.

use serde::Serialize;

/// Placeholder substituted with the normalized content.
pub const CONTENT_PLACEHOLDER: &str = "{content}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PromptTemplate {
    pub key: &'static str,
    pub title: &'static str,
    pub title_localized: &'static str,
    pub description: &'static str,
    #[serde(skip)]
    pub template: &'static str,
}

impl PromptTemplate {
    pub fn render(&self, content: &str) -> String {
        self.template.replacen(CONTENT_PLACEHOLDER, content, 1)
    }
}

pub const CATALOGUE: [PromptTemplate; 10] = [
    PromptTemplate {
        key: "challenge_thinking",
        title: "Challenge my thinking",
        title_localized: "내 사고에 도전하기",
        description: "비판적 사고를 통한 가정과 논리의 검증",
        template: "Here's what I'm planning:

{content}

Act as a critical thinker. Question my assumptions, logic, or blind spots — but don't rewrite anything. I want to stress-test my own thinking, not get new ideas.

Please provide your analysis in Korean.",
    },
    PromptTemplate {
        key: "reframe_lens",
        title: "Reframe through a different lens",
        title_localized: "다른 렌즈로 재구성하기",
        description: "새로운 관점에서 아이디어 재해석",
        template: "Here's the core idea I'm working with:

{content}

Help me reframe it through a different lens — like a new audience POV, emotional trigger, or brand positioning angle.

Please provide your analysis in Korean.",
    },
    PromptTemplate {
        key: "surface_question",
        title: "Surface the deeper question",
        title_localized: "더 깊은 질문 발견하기",
        description: "표면적 문제 뒤에 숨은 본질적 질문 찾기",
        template: "Here's the situation I'm thinking through:

{content}

Help me uncover the real strategic question underneath this. What should I actually be asking myself?

Please provide your analysis in Korean.",
    },
    PromptTemplate {
        key: "translate_gut_feeling",
        title: "Translate my gut feeling",
        title_localized: "직관을 언어화하기",
        description: "막연한 느낌을 구체적 언어로 전환",
        template: "Something about this feels off, but I can't explain why:

{content}

Help me put words to the tension I'm sensing. What might be misaligned or unclear?

Please provide your analysis in Korean.",
    },
    PromptTemplate {
        key: "second_order_effects",
        title: "Find the second-order effects",
        title_localized: "2차, 3차 효과 찾기",
        description: "결정의 장기적 파급효과 분석",
        template: "Here's the decision or idea I'm considering:

{content}

Help me think through the second- and third-order consequences — what might happen after the obvious outcomes?

Please provide your analysis in Korean.",
    },
    PromptTemplate {
        key: "unseen_variable",
        title: "Reveal the unseen variable",
        title_localized: "보이지 않는 변수 발견하기",
        description: "간과된 핵심 변수 식별",
        template: "Here's the plan or situation I'm analyzing:

{content}

What critical factor might I be overlooking — the hidden variable that could completely change the outcome if noticed?

Please provide your analysis in Korean.",
    },
    PromptTemplate {
        key: "extract_principle",
        title: "Extract the core principle",
        title_localized: "핵심 원리 추출하기",
        description: "성공/실패 사례에서 재사용 가능한 원리 도출",
        template: "Here's something that worked (or failed):

{content}

Help me extract the underlying principle so I can apply it elsewhere.

Please provide your analysis in Korean.",
    },
    PromptTemplate {
        key: "reverse_engineer_instinct",
        title: "Reverse-engineer my instinct",
        title_localized: "직관을 역설계하기",
        description: "직관적 판단의 논리적 근거 분석",
        template: "Here's my idea, and it feels right to me:

{content}

Help me unpack why this might make sense — even if I can't fully explain it yet.

Please provide your analysis in Korean.",
    },
    PromptTemplate {
        key: "hidden_pattern",
        title: "Find the hidden pattern",
        title_localized: "숨겨진 패턴 찾기",
        description: "여러 사례를 연결하는 공통 패턴 발견",
        template: "Here are a few examples or situations I've noticed:

{content}

Help me identify the hidden pattern or principle connecting them.

Please provide your analysis in Korean.",
    },
    PromptTemplate {
        key: "think_in_reverse",
        title: "Think in reverse",
        title_localized: "역방향 사고",
        description: "목표에서 현재로 역추적하여 필요조건 도출",
        template: "Here's my goal:

{content}

Instead of moving forward, walk me backward from the desired result — what would need to be true at each step for this to succeed?

Please provide your analysis in Korean.",
    },
];

pub fn find(key: &str) -> Option<&'static PromptTemplate> {
    CATALOGUE.iter().find(|t| t.key == key)
}

pub fn keys() -> impl Iterator<Item = &'static str> {
    CATALOGUE.iter().map(|t| t.key)
}
