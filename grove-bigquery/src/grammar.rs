//! The BigQuery SQL grammar.
//!
//! Operator precedence, lowest first:
//!
//! | level | operators                                   |
//! |-------|---------------------------------------------|
//! | 1     | `OR`                                        |
//! | 2     | `AND`                                       |
//! | 3     | `NOT` (prefix)                              |
//! | 4     | `=` `!=` `<>` `<` `>` `<=` `>=` `LIKE` `IN` `IS` |
//! | 5     | `+` `-` `\|\|`                              |
//! | 6     | `*` `/`                                     |
//! | 7     | `-` (prefix)                                |
//!
//! Keywords are case-insensitive and only recognized where the grammar
//! expects them; anywhere else they lex as identifiers.

use grove_gen::grammar::*;

const PREC_OR: i32 = 1;
const PREC_AND: i32 = 2;
const PREC_NOT: i32 = 3;
const PREC_COMPARE: i32 = 4;
const PREC_ADD: i32 = 5;
const PREC_MULTIPLY: i32 = 6;
const PREC_UNARY: i32 = 7;

fn binary(prec: i32, operator: Rule) -> Rule {
    prec_left(
        prec,
        seq([
            field("left", sym("_expression")),
            field("operator", operator),
            field("right", sym("_expression")),
        ]),
    )
}

fn expression_list() -> Rule {
    comma_sep1(sym("_expression"))
}

/// Builds the BigQuery grammar model.
pub fn bigquery() -> Grammar {
    Grammar::new("bigquery")
        .rule(
            "source_file",
            repeat(seq([sym("select_statement"), optional(string(";"))])),
        )
        // Statements
        .rule(
            "select_statement",
            seq([
                optional(sym("with_clause")),
                sym("select_clause"),
                optional(sym("from_clause")),
                optional(sym("where_clause")),
                optional(sym("group_by_clause")),
                optional(sym("having_clause")),
                optional(sym("order_by_clause")),
                optional(sym("limit_clause")),
            ]),
        )
        .rule("with_clause", seq([kw("WITH"), comma_sep1(sym("cte"))]))
        .rule(
            "cte",
            seq([
                field("name", sym("identifier")),
                kw("AS"),
                string("("),
                sym("select_statement"),
                string(")"),
            ]),
        )
        .rule(
            "select_clause",
            seq([
                kw("SELECT"),
                optional(choice([kw("DISTINCT"), kw("ALL")])),
                comma_sep1(sym("select_item")),
            ]),
        )
        .rule(
            "select_item",
            choice([sym("star"), sym("_expression"), sym("alias")]),
        )
        .rule(
            "alias",
            seq([
                field("value", sym("_expression")),
                optional(kw("AS")),
                field("alias", sym("identifier")),
            ]),
        )
        // FROM
        .rule("from_clause", seq([kw("FROM"), sym("_table_expression")]))
        .rule(
            "_table_expression",
            choice([sym("join_expression"), sym("_table_primary")]),
        )
        .rule(
            "_table_primary",
            choice([sym("_table_source"), sym("table_alias")]),
        )
        .rule(
            "_table_source",
            choice([
                sym("identifier"),
                sym("backtick_identifier"),
                sym("qualified_table_name"),
                sym("subquery"),
                sym("unnest_expression"),
            ]),
        )
        .rule(
            "table_alias",
            seq([
                field("table", sym("_table_source")),
                optional(kw("AS")),
                field("alias", sym("identifier")),
            ]),
        )
        .rule(
            "qualified_table_name",
            seq([
                choice([sym("identifier"), sym("backtick_identifier")]),
                string("."),
                sym("identifier"),
                optional(seq([string("."), sym("identifier")])),
            ]),
        )
        .rule(
            "join_expression",
            choice([
                seq([
                    field("left", sym("_table_expression")),
                    sym("join_type"),
                    field("right", sym("_table_primary")),
                    optional(sym("on_clause")),
                ]),
                seq([
                    field("left", sym("_table_expression")),
                    string(","),
                    field("right", sym("_table_primary")),
                ]),
            ]),
        )
        .rule(
            "join_type",
            choice([
                kw("JOIN"),
                seq([kw("INNER"), kw("JOIN")]),
                seq([
                    choice([kw("LEFT"), kw("RIGHT"), kw("FULL")]),
                    optional(kw("OUTER")),
                    kw("JOIN"),
                ]),
                seq([kw("CROSS"), kw("JOIN")]),
            ]),
        )
        .rule("on_clause", seq([kw("ON"), sym("_expression")]))
        .rule(
            "unnest_expression",
            seq([kw("UNNEST"), string("("), sym("_expression"), string(")")]),
        )
        // Remaining clauses
        .rule("where_clause", seq([kw("WHERE"), sym("_expression")]))
        .rule(
            "group_by_clause",
            seq([kw("GROUP"), kw("BY"), expression_list()]),
        )
        .rule("having_clause", seq([kw("HAVING"), sym("_expression")]))
        .rule(
            "order_by_clause",
            seq([kw("ORDER"), kw("BY"), comma_sep1(sym("order_item"))]),
        )
        .rule(
            "order_item",
            seq([
                sym("_expression"),
                optional(field("direction", choice([kw("ASC"), kw("DESC")]))),
            ]),
        )
        .rule(
            "limit_clause",
            seq([
                kw("LIMIT"),
                field("count", sym("number_literal")),
                optional(seq([kw("OFFSET"), field("offset", sym("number_literal"))])),
            ]),
        )
        // Expressions
        .rule(
            "_expression",
            choice([
                sym("binary_expression"),
                sym("unary_expression"),
                sym("parenthesized_expression"),
                sym("in_expression"),
                sym("is_expression"),
                sym("exists_expression"),
                sym("function_call"),
                sym("field_access"),
                sym("subquery"),
                sym("array_literal"),
                sym("struct_literal"),
                sym("backtick_identifier"),
                sym("identifier"),
                sym("number_literal"),
                sym("string_literal"),
                sym("boolean_literal"),
                sym("null_literal"),
            ]),
        )
        .rule(
            "binary_expression",
            choice([
                binary(PREC_OR, kw("OR")),
                binary(PREC_AND, kw("AND")),
                binary(
                    PREC_COMPARE,
                    choice([
                        string("="),
                        string("!="),
                        string("<>"),
                        string("<"),
                        string(">"),
                        string("<="),
                        string(">="),
                        kw("LIKE"),
                    ]),
                ),
                binary(PREC_ADD, choice([string("+"), string("-"), string("||")])),
                binary(PREC_MULTIPLY, choice([string("*"), string("/")])),
            ]),
        )
        .rule(
            "unary_expression",
            choice([
                prec(
                    PREC_NOT,
                    seq([
                        field("operator", kw("NOT")),
                        field("operand", sym("_expression")),
                    ]),
                ),
                prec(
                    PREC_UNARY,
                    seq([
                        field("operator", string("-")),
                        field("operand", sym("_expression")),
                    ]),
                ),
            ]),
        )
        .rule(
            "parenthesized_expression",
            seq([string("("), sym("_expression"), string(")")]),
        )
        .rule(
            "in_expression",
            prec_left(
                PREC_COMPARE,
                seq([
                    field("left", sym("_expression")),
                    optional(kw("NOT")),
                    kw("IN"),
                    field(
                        "right",
                        choice([
                            sym("subquery"),
                            sym("unnest_expression"),
                            sym("expression_list"),
                        ]),
                    ),
                ]),
            ),
        )
        .rule(
            "expression_list",
            seq([string("("), expression_list(), string(")")]),
        )
        .rule(
            "is_expression",
            prec_left(
                PREC_COMPARE,
                seq([
                    field("left", sym("_expression")),
                    kw("IS"),
                    optional(kw("NOT")),
                    field("right", choice([sym("null_literal"), sym("boolean_literal")])),
                ]),
            ),
        )
        .rule("exists_expression", seq([kw("EXISTS"), sym("subquery")]))
        .rule(
            "function_call",
            seq([
                field("name", sym("identifier")),
                string("("),
                optional(choice([
                    sym("star"),
                    seq([optional(kw("DISTINCT")), sym("_arguments")]),
                ])),
                string(")"),
                optional(field("over", sym("over_clause"))),
            ]),
        )
        .rule("_arguments", comma_sep1(field("argument", sym("_expression"))))
        .rule(
            "field_access",
            seq([
                field(
                    "object",
                    choice([
                        sym("identifier"),
                        sym("backtick_identifier"),
                        sym("field_access"),
                    ]),
                ),
                string("."),
                field(
                    "field",
                    choice([sym("identifier"), sym("backtick_identifier")]),
                ),
            ]),
        )
        .rule(
            "subquery",
            seq([string("("), sym("select_statement"), string(")")]),
        )
        .rule(
            "array_literal",
            seq([string("["), optional(expression_list()), string("]")]),
        )
        .rule(
            "struct_literal",
            seq([
                kw("STRUCT"),
                string("("),
                optional(comma_sep1(sym("struct_field"))),
                string(")"),
            ]),
        )
        .rule(
            "struct_field",
            seq([
                field("value", sym("_expression")),
                optional(seq([kw("AS"), field("name", sym("identifier"))])),
            ]),
        )
        // Window functions
        .rule(
            "over_clause",
            seq([
                kw("OVER"),
                string("("),
                optional(sym("partition_by_clause")),
                optional(sym("order_by_clause")),
                optional(sym("frame_clause")),
                string(")"),
            ]),
        )
        .rule(
            "partition_by_clause",
            seq([kw("PARTITION"), kw("BY"), expression_list()]),
        )
        .rule(
            "frame_clause",
            seq([
                field("unit", choice([kw("ROWS"), kw("RANGE")])),
                choice([
                    field("start", sym("frame_bound")),
                    seq([
                        kw("BETWEEN"),
                        field("start", sym("frame_bound")),
                        kw("AND"),
                        field("end", sym("frame_bound")),
                    ]),
                ]),
            ]),
        )
        .rule(
            "frame_bound",
            choice([
                seq([kw("UNBOUNDED"), choice([kw("PRECEDING"), kw("FOLLOWING")])]),
                seq([
                    sym("number_literal"),
                    choice([kw("PRECEDING"), kw("FOLLOWING")]),
                ]),
                seq([kw("CURRENT"), kw("ROW")]),
            ]),
        )
        // Tokens
        .rule("star", string("*"))
        .rule("boolean_literal", choice([kw("TRUE"), kw("FALSE")]))
        .rule("null_literal", kw("NULL"))
        .rule("number_literal", pattern(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?"))
        .rule(
            "string_literal",
            pattern(r#"'([^'\\\n]|\\.)*'|"([^"\\\n]|\\.)*""#),
        )
        .rule("backtick_identifier", pattern(r"`[^`\n]+`"))
        .rule("identifier", pattern(r"[A-Za-z_][A-Za-z0-9_]*"))
        .rule(
            "comment",
            pattern(r"--[^\n]*|#[^\n]*|/\*([^*]|\*+[^*/])*\*+/"),
        )
        .extra(pattern(r"\s+"))
        .extra(sym("comment"))
        .word("identifier")
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_gen::flatten::flatten;

    #[test]
    fn grammar_flattens() {
        let grammar = bigquery();
        assert_eq!(grammar.start_rule(), Some("source_file"));
        let flat = flatten(&grammar).unwrap();
        for kind in ["select_statement", "_expression", "identifier", "star", "SELECT"] {
            assert!(flat.find_symbol(kind).is_some(), "missing {}", kind);
        }
        assert_eq!(flat.word, flat.find_symbol("identifier"));
        assert_eq!(flat.extra_tokens, vec![flat.find_symbol("comment").unwrap()]);
        assert!(flat.field_names.iter().any(|f| f.as_str() == "left"));
    }
}
