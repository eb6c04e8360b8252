// file: src/llm/prompts.rs
// description: prompt templates for answer synthesis and answer evaluation
// reference: internal prompt catalogue

pub const QA_SYSTEM_PROMPT: &str = "You are an expert Q&A system that is trusted around the world.\n\
Always answer the query using the provided context information, and not prior knowledge.\n\
Some rules to follow:\n\
1. Never directly reference the given context in your answer.\n\
2. Avoid statements like 'Based on the context, ...' or 'The context information ...' or anything along those lines.";

pub fn text_qa_prompt(context: &str, query: &str) -> String {
    format!(
        "Context information is below.\n\
---------------------\n\
{context}\n\
---------------------\n\
Given the context information and not prior knowledge, answer the query.\n\
Query: {query}\n\
Answer: "
    )
}

pub fn refine_prompt(query: &str, existing_answer: &str, context: &str) -> String {
    format!(
        "The original query is as follows: {query}\n\
We have provided an existing answer: {existing_answer}\n\
We have the opportunity to refine the existing answer (only if needed) with some more context below.\n\
------------\n\
{context}\n\
------------\n\
Given the new context, refine the original answer to better answer the query. \
If the context isn't useful, return the original answer.\n\
Refined Answer: "
    )
}

const SCORE_FORMAT: &str = "Respond only with 'Score: <0-10>' on the first line, followed by \
'Supporting Evidence:' and a short justification.";

pub fn answer_relevance_system() -> String {
    format!(
        "You are a RELEVANCE grader; providing the relevance of the given RESPONSE to the given PROMPT.\n\
Score from 0 to 10, where 0 is the least relevant and 10 is the most relevant.\n\
Long and short responses should be scored equally. A response that answers the prompt \
completely and accurately gets 10.\n{SCORE_FORMAT}"
    )
}

pub fn answer_relevance_prompt(question: &str, answer: &str) -> String {
    format!("PROMPT: {question}\n\nRESPONSE: {answer}\n\nRELEVANCE: ")
}

pub fn context_relevance_system() -> String {
    format!(
        "You are a RELEVANCE grader; providing the relevance of the given CONTEXT to the given QUESTION.\n\
Score from 0 to 10, where 0 is the least relevant and 10 is the most relevant.\n\
A CONTEXT that contains the information needed to answer the QUESTION gets 10.\n{SCORE_FORMAT}"
    )
}

pub fn context_relevance_prompt(question: &str, context: &str) -> String {
    format!("QUESTION: {question}\n\nCONTEXT: {context}\n\nRELEVANCE: ")
}

pub fn groundedness_system() -> String {
    format!(
        "You are an INFORMATION OVERLAP classifier; deciding how much of the HYPOTHESIS is supported \
by the SOURCE.\nScore from 0 to 10, where 0 means no supporting information and 10 means \
the SOURCE fully supports the HYPOTHESIS.\n{SCORE_FORMAT}"
    )
}

pub fn groundedness_prompt(source: &str, statement: &str) -> String {
    format!("SOURCE: {source}\n\nHYPOTHESIS: {statement}\n\nSUPPORT: ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qa_prompt_embeds_inputs() {
        let prompt = text_qa_prompt("Article 17 text", "What is erasure?");
        assert!(prompt.contains("Article 17 text"));
        assert!(prompt.contains("Query: What is erasure?"));
        assert!(prompt.ends_with("Answer: "));
    }

    #[test]
    fn test_refine_prompt_keeps_existing_answer() {
        let prompt = refine_prompt("q", "draft answer", "more context");
        assert!(prompt.contains("existing answer: draft answer"));
        assert!(prompt.contains("more context"));
    }

    #[test]
    fn test_judge_prompts_request_score() {
        for system in [
            answer_relevance_system(),
            context_relevance_system(),
            groundedness_system(),
        ] {
            assert!(system.contains("Score: <0-10>"));
        }
    }
}
