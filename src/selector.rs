/// Selects graph inputs or outputs by name.
#[derive(Clone, Debug, PartialEq)]
pub enum TensorSelector {
    /// Exactly these tensors. Every name must exist in the graph.
    Names(Vec<String>),

    /// Whichever of these well-known names exist. At least one must.
    AnyOf(Vec<String>),
}

/// Names a [`TensorSelector`] failed to find, and the names it searched.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectError {
    pub missing: Vec<String>,
    pub candidates: Vec<String>,
}

impl TensorSelector {
    /// Select explicitly named tensors.
    pub fn names<S: AsRef<str>>(names: &[S]) -> Self {
        Self::Names(names.iter().map(|n| n.as_ref().to_string()).collect())
    }

    /// Names used for token sequence inputs by common text-to-speech models.
    pub fn default_inputs() -> Self {
        Self::AnyOf(vec!["input_ids".into(), "tokens".into()])
    }

    /// Names used for waveform outputs by common text-to-speech models.
    pub fn default_outputs() -> Self {
        Self::AnyOf(vec!["audio".into(), "waveform".into()])
    }

    /// Return the names from `available` which this selector matches, in the
    /// order they appear in `available`.
    pub fn select<'a>(&self, available: &[&'a str]) -> Result<Vec<&'a str>, SelectError> {
        let error = |missing: Vec<String>| SelectError {
            missing,
            candidates: available.iter().map(|s| s.to_string()).collect(),
        };

        match self {
            Self::Names(names) => {
                let missing: Vec<String> = names
                    .iter()
                    .filter(|name| !available.contains(&name.as_str()))
                    .cloned()
                    .collect();
                if !missing.is_empty() {
                    return Err(error(missing));
                }
                Ok(available
                    .iter()
                    .copied()
                    .filter(|name| names.iter().any(|n| n == name))
                    .collect())
            }
            Self::AnyOf(names) => {
                let matched: Vec<&str> = available
                    .iter()
                    .copied()
                    .filter(|name| names.iter().any(|n| n == name))
                    .collect();
                if matched.is_empty() {
                    return Err(error(names.clone()));
                }
                Ok(matched)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use static_shape_testing::TestCases;

    use super::TensorSelector;

    #[test]
    fn test_select() {
        #[derive(Debug)]
        struct Case {
            selector: TensorSelector,
            available: Vec<&'static str>,
            expected: Result<Vec<&'static str>, Vec<&'static str>>,
        }

        let cases = [
            Case {
                selector: TensorSelector::default_inputs(),
                available: vec!["tokens", "style", "speed"],
                expected: Ok(vec!["tokens"]),
            },
            Case {
                selector: TensorSelector::default_inputs(),
                available: vec!["style", "input_ids", "tokens"],
                expected: Ok(vec!["input_ids", "tokens"]),
            },
            Case {
                selector: TensorSelector::default_inputs(),
                available: vec!["text"],
                expected: Err(vec!["input_ids", "tokens"]),
            },
            Case {
                selector: TensorSelector::names(&["phonemes"]),
                available: vec!["phonemes", "tokens"],
                expected: Ok(vec!["phonemes"]),
            },
            Case {
                selector: TensorSelector::names(&["phonemes", "speaker"]),
                available: vec!["phonemes"],
                expected: Err(vec!["speaker"]),
            },
        ];

        cases.test_each(|case| {
            let result = case.selector.select(&case.available);
            match &case.expected {
                Ok(names) => assert_eq!(result.as_ref().ok(), Some(names)),
                Err(missing) => {
                    let err = result.err().unwrap();
                    assert_eq!(&err.missing, missing);
                    assert_eq!(err.candidates, case.available);
                }
            }
        })
    }
}
