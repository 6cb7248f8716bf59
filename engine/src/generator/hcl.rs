//! Minimal HCL writer for generated Terraform documents

/// Attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Quoted, escaped string
    Str(String),
    /// Unquoted expression such as a resource reference
    Raw(String),
    Bool(bool),
    Num(i64),
    List(Vec<Value>),
    Map(Vec<(String, Value)>),
    /// `<<TAG` heredoc; the body is emitted verbatim apart from interpolation escapes
    Heredoc { tag: String, body: String },
}

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Attr(String, Value),
    Block(Block),
}

/// A block such as `resource "aws_vpc" "main" { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    kind: String,
    labels: Vec<String>,
    entries: Vec<Entry>,
}

impl Block {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            labels: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn resource(resource_type: &str, name: &str) -> Self {
        Self::new("resource").label(resource_type).label(name)
    }

    pub fn provider(name: &str) -> Self {
        Self::new("provider").label(name)
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn attr(mut self, key: &str, value: Value) -> Self {
        self.entries.push(Entry::Attr(key.to_string(), value));
        self
    }

    pub fn str(self, key: &str, value: impl Into<String>) -> Self {
        self.attr(key, Value::Str(value.into()))
    }

    pub fn raw(self, key: &str, expr: impl Into<String>) -> Self {
        self.attr(key, Value::Raw(expr.into()))
    }

    pub fn bool(self, key: &str, value: bool) -> Self {
        self.attr(key, Value::Bool(value))
    }

    pub fn num(self, key: &str, value: i64) -> Self {
        self.attr(key, Value::Num(value))
    }

    /// List of unquoted expressions
    pub fn raw_list<I, S>(self, key: &str, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = items.into_iter().map(|s| Value::Raw(s.into())).collect();
        self.attr(key, Value::List(items))
    }

    /// List of quoted strings
    pub fn str_list<I, S>(self, key: &str, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = items.into_iter().map(|s| Value::Str(s.into())).collect();
        self.attr(key, Value::List(items))
    }

    /// `tags = { Name = "..." }`
    pub fn name_tag(self, name: &str) -> Self {
        self.attr(
            "tags",
            Value::Map(vec![("Name".to_string(), Value::Str(name.to_string()))]),
        )
    }

    pub fn block(mut self, block: Block) -> Self {
        self.entries.push(Entry::Block(block));
        self
    }

    /// Render as a top-level block followed by a blank line
    pub fn render(&self) -> String {
        let mut output = String::new();
        self.render_into(&mut output, 0);
        output.push('\n');
        output
    }

    fn render_into(&self, output: &mut String, depth: usize) {
        push_indent(output, depth);
        output.push_str(&self.kind);
        for label in &self.labels {
            output.push_str(" \"");
            output.push_str(&escape(label));
            output.push('"');
        }
        output.push_str(" {\n");

        // Consecutive attributes align their '=' like `terraform fmt`
        let mut index = 0;
        while index < self.entries.len() {
            match &self.entries[index] {
                Entry::Block(block) => {
                    if index > 0 {
                        output.push('\n');
                    }
                    block.render_into(output, depth + 1);
                    index += 1;
                }
                Entry::Attr(..) => {
                    let run_end = self.entries[index..]
                        .iter()
                        .position(|e| matches!(e, Entry::Block(_)))
                        .map(|p| index + p)
                        .unwrap_or(self.entries.len());
                    let width = self.entries[index..run_end]
                        .iter()
                        .filter_map(|e| match e {
                            Entry::Attr(key, _) => Some(key.len()),
                            Entry::Block(_) => None,
                        })
                        .max()
                        .unwrap_or(0);
                    if index > 0 {
                        output.push('\n');
                    }
                    for entry in &self.entries[index..run_end] {
                        if let Entry::Attr(key, value) = entry {
                            push_attr(output, depth + 1, key, width, value);
                        }
                    }
                    index = run_end;
                }
            }
        }

        push_indent(output, depth);
        output.push_str("}\n");
    }
}

fn push_attr(output: &mut String, depth: usize, key: &str, width: usize, value: &Value) {
    push_indent(output, depth);
    output.push_str(key);
    for _ in key.len()..width {
        output.push(' ');
    }
    output.push_str(" = ");
    push_value(output, depth, value);
    output.push('\n');
}

fn push_value(output: &mut String, depth: usize, value: &Value) {
    match value {
        Value::Str(s) => {
            output.push('"');
            output.push_str(&escape(s));
            output.push('"');
        }
        Value::Raw(expr) => output.push_str(expr),
        Value::Bool(b) => output.push_str(if *b { "true" } else { "false" }),
        Value::Num(n) => output.push_str(&n.to_string()),
        Value::List(items) => {
            output.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    output.push_str(", ");
                }
                push_value(output, depth, item);
            }
            output.push(']');
        }
        Value::Map(pairs) => {
            output.push_str("{\n");
            let width = pairs.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
            for (key, value) in pairs {
                push_attr(output, depth + 1, key, width, value);
            }
            push_indent(output, depth);
            output.push('}');
        }
        Value::Heredoc { tag, body } => {
            output.push_str("<<");
            output.push_str(tag);
            output.push('\n');
            let body = escape_interpolation(body.trim_end());
            output.push_str(&body);
            output.push('\n');
            output.push_str(tag);
        }
    }
}

fn push_indent(output: &mut String, depth: usize) {
    for _ in 0..depth {
        output.push_str("  ");
    }
}

/// Escape a string literal body
pub fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escape_interpolation(&escaped)
}

fn escape_interpolation(s: &str) -> String {
    s.replace("${", "$${").replace("%{", "%%{")
}

/// Turn a display name into a valid resource label
pub fn resource_label(name: &str) -> String {
    let mut label: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if label.is_empty() {
        label.push_str("unnamed");
    }
    if label.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
        label.insert(0, '_');
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_aligned_block() {
        let block = Block::resource("aws_vpc", "main")
            .str("cidr_block", "10.0.0.0/16")
            .bool("enable_dns_support", true)
            .name_tag("main");

        let expected = "resource \"aws_vpc\" \"main\" {\n  cidr_block         = \"10.0.0.0/16\"\n  enable_dns_support = true\n  tags               = {\n    Name = \"main\"\n  }\n}\n\n";
        assert_eq!(block.render(), expected);
    }

    #[test]
    fn test_nested_block_and_lists() {
        let block = Block::resource("aws_security_group", "web")
            .raw("vpc_id", "aws_vpc.main.id")
            .block(
                Block::new("ingress")
                    .num("from_port", 80)
                    .str_list("cidr_blocks", ["0.0.0.0/0"]),
            );

        let rendered = block.render();
        assert!(rendered.contains("  vpc_id = aws_vpc.main.id\n\n  ingress {\n"));
        assert!(rendered.contains("    cidr_blocks = [\"0.0.0.0/0\"]\n"));
    }

    #[test]
    fn test_escape_quotes_and_interpolation() {
        assert_eq!(escape(r#"a "b" ${c}"#), r#"a \"b\" $${c}"#);
        assert_eq!(escape("line\nnext"), "line\\nnext");
    }

    #[test]
    fn test_heredoc() {
        let block = Block::resource("aws_s3_bucket_policy", "p").attr(
            "policy",
            Value::Heredoc {
                tag: "POLICY".to_string(),
                body: "{\"Version\": \"2012-10-17\"}\n".to_string(),
            },
        );
        assert!(block
            .render()
            .contains("policy = <<POLICY\n{\"Version\": \"2012-10-17\"}\nPOLICY\n"));
    }

    #[test]
    fn test_resource_label() {
        assert_eq!(resource_label("web-subnet_1"), "web-subnet_1");
        assert_eq!(resource_label("prod vpc"), "prod_vpc");
        assert_eq!(resource_label("1st"), "_1st");
        assert_eq!(resource_label(""), "unnamed");
        assert_eq!(resource_label("生产"), "__");
    }
}
