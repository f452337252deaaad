/// A transformation applied to every password of the base list. Each stage
/// keeps its input and adds its variants next to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Capitalize,
    LightLeet,
}

/// Depth selects exactly one pipeline, applied left to right.
pub fn pipeline_for_depth(depth: u8) -> &'static [Stage] {
    match depth {
        0 => &[],
        1 => &[Stage::Capitalize],
        2 => &[Stage::LightLeet],
        _ => &[Stage::LightLeet, Stage::Capitalize],
    }
}

impl Stage {
    pub fn apply(&self, input: Vec<String>) -> Vec<String> {
        match self {
            Stage::Capitalize => input
                .into_iter()
                .flat_map(|p| {
                    let capitalized = capitalize(&p);
                    [p, capitalized]
                })
                .collect(),
            Stage::LightLeet => input.into_iter().flat_map(|p| light_leet(&p)).collect(),
        }
    }
}

/// Uppercases the first character when it is a letter.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() => first.to_uppercase().chain(chars).collect(),
        _ => s.to_string(),
    }
}

/// The input plus o→0, i→1, e→3 each on their own, plus all three at once.
pub fn light_leet(s: &str) -> [String; 5] {
    [
        s.to_string(),
        s.replace('o', "0"),
        s.replace('i', "1"),
        s.replace('e', "3"),
        s.replace('o', "0").replace('i', "1").replace('e', "3"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "")]
    #[case("1abc", "1abc")]
    #[case("password", "Password")]
    #[case("Password", "Password")]
    #[case("émile", "Émile")]
    #[case("@home", "@home")]
    fn test_capitalize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(capitalize(input), expected);
    }

    #[test]
    fn test_light_leet_forms() {
        assert_eq!(
            light_leet("qwertyuiop"),
            [
                "qwertyuiop".to_string(),
                "qwertyui0p".to_string(),
                "qwertyu1op".to_string(),
                "qw3rtyuiop".to_string(),
                "qw3rtyu10p".to_string(),
            ]
        );
    }

    #[test]
    fn test_pipelines() {
        assert!(pipeline_for_depth(0).is_empty());
        assert_eq!(pipeline_for_depth(1), &[Stage::Capitalize]);
        assert_eq!(pipeline_for_depth(2), &[Stage::LightLeet]);
        assert_eq!(pipeline_for_depth(3), &[Stage::LightLeet, Stage::Capitalize]);
        assert_eq!(pipeline_for_depth(9), pipeline_for_depth(3));
    }

    #[test]
    fn test_capitalize_stage_keeps_original() {
        let out = Stage::Capitalize.apply(vec!["acme".to_string(), "1q2w".to_string()]);
        assert_eq!(out, vec!["acme", "Acme", "1q2w", "1q2w"]);
    }
}
