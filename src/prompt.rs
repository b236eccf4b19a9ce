/// Render the relevance-judging instruction for `query`.
///
/// The template is fixed apart from the query and the collection list.
/// The model is asked for bare `collection:chapter:item` ids; anything else
/// it emits is discarded by the extractor.
pub fn build_prompt<S: AsRef<str>>(query: &str, collections: &[S]) -> String {
    let names = collections
        .iter()
        .map(|c| c.as_ref())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are a strict relevance judge for a hadith search engine.\n\
         \n\
         Query: \"{query}\"\n\
         \n\
         Select only hadiths that are directly about the query.\n\
         Rules:\n\
         - The hadith must explicitly mention or clearly address the topic of the query.\n\
         - Do not include hadiths that are only tangentially or loosely related.\n\
         - Do not include a hadith just because it shares a word with the query.\n\
         - If nothing is clearly relevant, answer with an empty line.\n\
         \n\
         Output format:\n\
         - A single line of comma-separated ids, most relevant first.\n\
         - Every id must have the exact form collection:chapter:number, for example bukhari:1:1.\n\
         - Valid collections: {names}.\n\
         - No explanations, no numbering, no other text.\n\
         \n\
         Ids:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::COLLECTIONS;

    #[test]
    fn embeds_query_literally() {
        let prompt = build_prompt("kindness to \"parents\"", COLLECTIONS);
        assert!(prompt.contains("Query: \"kindness to \"parents\"\""));
    }

    #[test]
    fn lists_every_collection_and_format() {
        let prompt = build_prompt("fasting", COLLECTIONS);
        for name in COLLECTIONS {
            assert!(prompt.contains(name), "missing {name}");
        }
        assert!(prompt.contains("collection:chapter:number"));
        assert!(prompt.trim_end().ends_with("Ids:"));
    }

    #[test]
    fn deterministic_for_same_input() {
        assert_eq!(
            build_prompt("charity", &["bukhari"]),
            build_prompt("charity", &["bukhari"])
        );
        assert_ne!(
            build_prompt("charity", &["bukhari"]),
            build_prompt("prayer", &["bukhari"])
        );
    }
}
