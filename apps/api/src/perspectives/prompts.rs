// Prompt constants for the synthesis step and locale-formatted failure text.
// Reuses the cross-cutting system prompt from llm_client::prompts.

/// Prefix of a perspective's result text when its dispatch failed.
pub const PERSPECTIVE_ERROR_PREFIX: &str = "분석 중 오류 발생";

/// Prefix of the synthesis text when the synthesis dispatch failed.
pub const SYNTHESIS_ERROR_PREFIX: &str = "요약 생성 중 오류 발생";

/// Synthesis prompt template. Replace `{combined_analysis}` before sending.
pub const SYNTHESIS_PROMPT_TEMPLATE: &str = "다음은 하나의 아이디어/계획/전략을 10가지 관점에서 분석한 결과입니다:

{combined_analysis}

위의 10가지 분석 결과를 종합하여, 다음 내용을 포함한 통합 요약을 작성해주세요:

1. **핵심 인사이트**: 가장 중요한 발견사항 3-5가지
2. **주요 위험 요소**: 반드시 고려해야 할 리스크
3. **개선 방향**: 구체적인 개선 제안
4. **실행 우선순위**: 먼저 해결해야 할 과제

한국어로 작성해주세요.";
