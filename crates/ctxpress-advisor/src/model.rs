//! Structural records describing a class for prompt construction

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
}

impl ParameterInfo {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// A method with its full source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    /// Complete source of the method, signature and body
    pub text: String,
    #[serde(default)]
    pub return_type: String,
    #[serde(default)]
    pub parameters: Vec<ParameterInfo>,
}

impl MethodInfo {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            return_type: String::new(),
            parameters: Vec::new(),
        }
    }

    pub fn returning(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = return_type.into();
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.parameters.push(ParameterInfo::new(name, type_name));
        self
    }

    /// `name(p: T, q: U): R`, omitting the return type when it is empty
    pub fn signature(&self) -> String {
        let params = self
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.type_name))
            .collect::<Vec<_>>()
            .join(", ");

        if self.return_type.is_empty() {
            format!("{}({})", self.name, params)
        } else {
            format!("{}({}): {}", self.name, params, self.return_type)
        }
    }
}

/// Outline of a class: its fields and method signatures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub name: String,
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
}

impl ClassSummary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Render the outline as compact pseudo-code
    ///
    /// ```text
    /// package com.example
    /// class BlogService {
    ///   repository: BlogRepository
    ///   + BlogService(repository: BlogRepository)
    ///   + findAll(): List<Blog>
    /// }
    /// ```
    pub fn format(&self) -> String {
        let mut out = String::new();
        if !self.package.is_empty() {
            out.push_str("package ");
            out.push_str(&self.package);
            out.push('\n');
        }

        out.push_str("class ");
        out.push_str(&self.name);
        out.push_str(" {\n");

        for field in &self.fields {
            out.push_str(&format!("  {}: {}\n", field.name, field.type_name));
        }

        for method in &self.methods {
            let signature = if method.name == self.name {
                // constructors carry no return type
                MethodInfo {
                    return_type: String::new(),
                    ..method.clone()
                }
                .signature()
            } else {
                method.signature()
            };
            out.push_str("  + ");
            out.push_str(&signature);
            out.push('\n');
        }

        out.push('}');
        out
    }
}

/// Declaration text paired with its outline, as read from JSON input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    #[serde(default)]
    pub text: String,
    pub summary: ClassSummary,
}
