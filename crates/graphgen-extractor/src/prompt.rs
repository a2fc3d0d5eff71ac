//! Prompt templates for knowledge-graph extraction

use crate::config::FormatConfig;
use crate::language::{detect_language, Language};
use graphgen_domain::GRAPH_FIELD_SEP;

const EXTRACTION_TEMPLATE_EN: &str = r#"-Goal-
Given a text document and a list of entity types, identify all entities of those types from the text and all relationships among the identified entities.
Use {language} as output language.

-Steps-
1. Identify all entities. For each identified entity, extract the following information:
- entity_name: Name of the entity, use same language as input text. If English, capitalize the name.
- entity_type: One of the following types: [{entity_types}]
- entity_description: Comprehensive description of the entity's attributes and activities
Format each entity as ("entity"{tuple_delimiter}<entity_name>{tuple_delimiter}<entity_type>{tuple_delimiter}<entity_description>)

2. From the entities identified in step 1, identify all pairs of (source_entity, target_entity) that are *clearly related* to each other.
For each pair of related entities, extract the following information:
- source_entity: name of the source entity, as identified in step 1
- target_entity: name of the target entity, as identified in step 1
- relationship_description: explanation as to why you think the source entity and the target entity are related to each other
- relationship_keywords: one or more high-level keywords, separated by commas, that summarize the overall nature of the relationship
- relationship_strength: a numeric score indicating strength of the relationship between the source entity and target entity
Format each relationship as ("relationship"{tuple_delimiter}<source_entity>{tuple_delimiter}<target_entity>{tuple_delimiter}<relationship_description>{tuple_delimiter}<relationship_keywords>{tuple_delimiter}<relationship_strength>)

3. Return output in {language} as a single list of all the entities and relationships identified in steps 1 and 2. Use **{record_delimiter}** as the list delimiter.

4. When finished, output {completion_delimiter}

################
-Example-
################
Text:
In the second century of the city, Entity1 was founded by Person1 as a trading company for river shipping.
################
Output:
("entity"{tuple_delimiter}"Entity1"{tuple_delimiter}"organization"{tuple_delimiter}"Entity1 is a trading company for river shipping founded in the second century of the city."){record_delimiter}
("entity"{tuple_delimiter}"Person1"{tuple_delimiter}"person"{tuple_delimiter}"Person1 is the founder of Entity1."){record_delimiter}
("relationship"{tuple_delimiter}"Person1"{tuple_delimiter}"Entity1"{tuple_delimiter}"Person1 founded Entity1 as a river shipping company."{tuple_delimiter}"founding, ownership"{tuple_delimiter}9){completion_delimiter}

################
-Real Data-
################
Entity_types: {entity_types}
Text: {input_text}
################
Output:
"#;

const EXTRACTION_TEMPLATE_ZH: &str = r#"-目标-
给定一个文本文档和一个实体类型列表，从文本中识别出这些类型的所有实体，以及已识别实体之间的所有关系。
使用{language}作为输出语言。

-步骤-
1. 识别所有实体。对于每个识别出的实体，提取以下信息：
- entity_name：实体名称，使用与输入文本相同的语言。
- entity_type：以下类型之一：[{entity_types}]
- entity_description：对实体属性和活动的全面描述
将每个实体格式化为("entity"{tuple_delimiter}<entity_name>{tuple_delimiter}<entity_type>{tuple_delimiter}<entity_description>)

2. 从步骤1中识别的实体中，找出所有*明确相关*的(source_entity, target_entity)对。
对于每对相关实体，提取以下信息：
- source_entity：源实体名称，与步骤1中识别的一致
- target_entity：目标实体名称，与步骤1中识别的一致
- relationship_description：解释源实体和目标实体之间为何相关
- relationship_keywords：一个或多个以逗号分隔的高层次关键词，概括关系的整体性质
- relationship_strength：表示源实体与目标实体之间关系强度的数值
将每个关系格式化为("relationship"{tuple_delimiter}<source_entity>{tuple_delimiter}<target_entity>{tuple_delimiter}<relationship_description>{tuple_delimiter}<relationship_keywords>{tuple_delimiter}<relationship_strength>)

3. 以{language}返回步骤1和2中识别的所有实体和关系的单一列表。使用**{record_delimiter}**作为列表分隔符。

4. 完成后，输出{completion_delimiter}

################
-示例-
################
文本：
在城市建立的第二个世纪，张三创立了实体一，这是一家经营内河航运的贸易公司。
################
输出：
("entity"{tuple_delimiter}"实体一"{tuple_delimiter}"organization"{tuple_delimiter}"实体一是一家由张三创立的内河航运贸易公司。"){record_delimiter}
("entity"{tuple_delimiter}"张三"{tuple_delimiter}"person"{tuple_delimiter}"张三是实体一的创始人。"){record_delimiter}
("relationship"{tuple_delimiter}"张三"{tuple_delimiter}"实体一"{tuple_delimiter}"张三创立了实体一。"{tuple_delimiter}"创立, 所有权"{tuple_delimiter}9){completion_delimiter}

################
-真实数据-
################
实体类型：{entity_types}
文本：{input_text}
################
输出：
"#;

const IF_LOOP_EN: &str = "It appears some entities and relationships may have still been missed. \
Answer YES | NO if there are still entities and relationships that need to be added.";

const IF_LOOP_ZH: &str = "似乎仍有一些实体和关系被遗漏。如果仍有需要添加的实体和关系，请回答YES | NO。";

const CONTINUE_EN: &str = "MANY entities and relationships were missed in the last extraction. \
Add them below using the same format:";

const CONTINUE_ZH: &str = "上一次抽取中遗漏了很多实体和关系。请使用相同的格式在下面补充：";

const SUMMARY_TEMPLATE_EN: &str = r#"You are a helpful assistant responsible for generating a comprehensive summary of the data provided below.
Given an entity or a pair of entities, and a list of descriptions, all related to the same entity or group of entities.
Please concatenate all of these into a single, comprehensive description. Make sure to include information collected from all the descriptions.
If the provided descriptions are contradictory, please resolve the contradictions and provide a single, coherent summary.
Make sure it is written in third person, and include the entity names so we have the full context.
Use {language} as output language.

#######
-Data-
Entities: {entity_name}
Description List: {description_list}
#######
Output:
"#;

const SUMMARY_TEMPLATE_ZH: &str = r#"你是一个乐于助人的助手，负责为以下数据生成全面的摘要。
给定一个实体或一对实体，以及一组描述，它们都与同一实体或同一组实体相关。
请将所有这些描述合并为一个全面的描述，确保包含所有描述中的信息。
如果描述之间存在矛盾，请解决矛盾并给出一个连贯的摘要。
请使用第三人称，并包含实体名称，以便我们了解完整的上下文。
使用{language}作为输出语言。

#######
-数据-
实体：{entity_name}
描述列表：{description_list}
#######
输出：
"#;

/// Placeholder values for one chunk's hint prompt
///
/// Built fresh for every chunk and never shared, so concurrent chunks in
/// different languages cannot observe each other's values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatParams {
    /// Output language named in the prompt
    pub language: Language,
    /// Field separator
    pub tuple_delimiter: String,
    /// Record separator
    pub record_delimiter: String,
    /// End-of-output marker
    pub completion_delimiter: String,
    /// Comma-joined entity types
    pub entity_types: String,
}

impl FormatParams {
    /// Build parameters for `language` from the shared format settings
    pub fn new(language: Language, format: &FormatConfig) -> Self {
        Self {
            language,
            tuple_delimiter: format.tuple_delimiter.clone(),
            record_delimiter: format.record_delimiter.clone(),
            completion_delimiter: format.completion_delimiter.clone(),
            entity_types: format.entity_types.join(","),
        }
    }

    /// Fill every placeholder of `template`
    ///
    /// `{input_text}` is substituted last so braces inside the chunk text are
    /// never treated as placeholders.
    fn render(&self, template: &str, input_text: &str) -> String {
        template
            .replace("{language}", self.language.as_str())
            .replace("{tuple_delimiter}", &self.tuple_delimiter)
            .replace("{record_delimiter}", &self.record_delimiter)
            .replace("{completion_delimiter}", &self.completion_delimiter)
            .replace("{entity_types}", &self.entity_types)
            .replace("{input_text}", input_text)
    }
}

/// The three prompts driving one chunk's glean loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionPrompts {
    /// Language the templates were chosen for
    pub language: Language,
    /// Initial extraction prompt, with the chunk text embedded
    pub hint: String,
    /// "Should I continue?" query
    pub if_loop: &'static str,
    /// "Continue extracting" query
    pub continue_extraction: &'static str,
}

/// Builds prompts from the configured format
#[derive(Debug, Clone)]
pub struct PromptComposer {
    format: FormatConfig,
}

impl PromptComposer {
    /// Create a composer for the given format
    pub fn new(format: FormatConfig) -> Self {
        Self { format }
    }

    /// Compose the prompts for one chunk's text
    pub fn compose(&self, text: &str) -> ExtractionPrompts {
        let language = detect_language(text);
        let params = FormatParams::new(language, &self.format);
        let (template, if_loop, continue_extraction) = match language {
            Language::English => (EXTRACTION_TEMPLATE_EN, IF_LOOP_EN, CONTINUE_EN),
            Language::Chinese => (EXTRACTION_TEMPLATE_ZH, IF_LOOP_ZH, CONTINUE_ZH),
        };

        ExtractionPrompts {
            language,
            hint: params.render(template, text),
            if_loop,
            continue_extraction,
        }
    }

    /// Compose the description summarisation prompt
    ///
    /// `label` is the entity name, or `(src, tgt)` for an edge.
    /// `descriptions` is a `<SEP>`-joined description list.
    pub fn summary_prompt(&self, language: Language, label: &str, descriptions: &str) -> String {
        let template = match language {
            Language::English => SUMMARY_TEMPLATE_EN,
            Language::Chinese => SUMMARY_TEMPLATE_ZH,
        };
        let list: Vec<&str> = descriptions
            .split(GRAPH_FIELD_SEP)
            .filter(|d| !d.is_empty())
            .collect();

        template
            .replace("{language}", language.as_str())
            .replace("{entity_name}", label)
            .replace("{description_list}", &list.join("\n"))
    }
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new(FormatConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_hint_embeds_text_and_delimiters() {
        let composer = PromptComposer::default();
        let prompts = composer.compose("Entity1 was founded by Person1.");

        assert_eq!(prompts.language, Language::English);
        assert!(prompts.hint.contains("Text: Entity1 was founded by Person1."));
        assert!(prompts.hint.contains("Use English as output language."));
        assert!(prompts.hint.contains("<|>"));
        assert!(prompts.hint.contains("<|COMPLETE|>"));
        assert!(!prompts.hint.contains("{tuple_delimiter}"));
        assert!(!prompts.hint.contains("{input_text}"));
        assert_eq!(prompts.if_loop, IF_LOOP_EN);
        assert_eq!(prompts.continue_extraction, CONTINUE_EN);
    }

    #[test]
    fn test_chinese_text_selects_chinese_templates() {
        let composer = PromptComposer::default();
        let prompts = composer.compose("张三创立了公司");

        assert_eq!(prompts.language, Language::Chinese);
        assert!(prompts.hint.contains("文本：张三创立了公司"));
        assert!(prompts.hint.contains("使用Chinese作为输出语言"));
        assert_eq!(prompts.if_loop, IF_LOOP_ZH);
    }

    #[test]
    fn test_braces_in_input_are_left_alone() {
        let composer = PromptComposer::default();
        let prompts = composer.compose("literal {tuple_delimiter} in text");
        assert!(prompts.hint.contains("Text: literal {tuple_delimiter} in text"));
    }

    #[test]
    fn test_custom_delimiters_flow_into_prompt() {
        let format = FormatConfig {
            tuple_delimiter: "|".to_string(),
            entity_types: vec!["gene".to_string(), "disease".to_string()],
            ..FormatConfig::default()
        };
        let prompts = PromptComposer::new(format).compose("BRCA1");
        assert!(prompts.hint.contains("[gene,disease]"));
        assert!(prompts.hint.contains("(\"entity\"|<entity_name>|"));
    }

    #[test]
    fn test_interleaved_languages_do_not_leak() {
        let composer = PromptComposer::default();
        let zh = composer.compose("知识");
        let en = composer.compose("knowledge");
        assert!(zh.hint.contains("Chinese"));
        assert!(en.hint.contains("Use English"));
        assert!(!en.hint.contains("Chinese"));
    }

    #[test]
    fn test_summary_prompt_lists_descriptions() {
        let composer = PromptComposer::default();
        let prompt = composer.summary_prompt(Language::English, "Entity1", "A firm<SEP>A company");
        assert!(prompt.contains("Entities: Entity1"));
        assert!(prompt.contains("A firm\nA company"));
        assert!(!prompt.contains("<SEP>"));
    }
}
