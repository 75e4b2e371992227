use crate::{
    ast::{
        common::{NullPrecedence, OrderDir},
        select::{FromClause, JoinClause, OrderByExpr, Select, TableSource},
    },
    renderer::{Render, Renderer},
};

impl Render for Select {
    fn render(&self, r: &mut Renderer) {
        // 1. SELECT clause
        r.sql.push_str("SELECT ");
        r.render_list(&self.columns);

        // 2. FROM
        if let Some(from) = &self.from {
            r.sql.push(' ');
            from.render(r);
        }

        // 3. JOIN
        for join in &self.joins {
            r.sql.push(' ');
            join.render(r);
        }

        // 4. WHERE
        if let Some(where_clause) = &self.where_clause {
            r.sql.push_str(" WHERE ");
            where_clause.render(r);
        }

        // 5. GROUP BY
        if !self.group_by.is_empty() {
            r.sql.push_str(" GROUP BY ");
            r.render_list(&self.group_by);
        }

        // 6. HAVING
        if let Some(having) = &self.having {
            r.sql.push_str(" HAVING ");
            having.render(r);
        }

        // 7. ORDER BY
        if !self.order_by.is_empty() {
            r.sql.push_str(" ORDER BY ");
            r.render_list(&self.order_by);
        }

        // 8. LIMIT
        if let Some(limit) = &self.limit {
            r.sql.push_str(" LIMIT ");
            limit.render(r);
        }

        // 9. OFFSET
        if let Some(offset) = &self.offset {
            r.sql.push_str(" OFFSET ");
            offset.render(r);
        }
    }
}

impl Render for TableSource {
    fn render(&self, r: &mut Renderer) {
        match self {
            TableSource::Table(table) => r.render_table_ref(table),
            TableSource::SubQuery(select) => {
                r.sql.push('(');
                select.render(r);
                r.sql.push(')');
            }
        }
    }
}

impl Render for FromClause {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("FROM ");
        self.source.render(r);
        r.render_table_alias(self.alias.as_deref());
    }
}

impl Render for JoinClause {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str(self.kind.keyword());
        r.sql.push(' ');
        self.source.render(r);
        r.render_table_alias(self.alias.as_deref());
        r.sql.push_str(" ON ");
        self.on.render(r);
    }
}

impl Render for OrderByExpr {
    fn render(&self, r: &mut Renderer) {
        if self.ignore_case {
            r.sql.push_str(r.dialect.case_fold_function());
            r.sql.push('(');
            self.expr.render(r);
            r.sql.push(')');
        } else {
            self.expr.render(r);
        }

        if let Some(dir) = &self.direction {
            let dir_str = match dir {
                OrderDir::Asc => "ASC",
                OrderDir::Desc => "DESC",
            };
            r.sql.push(' ');
            r.sql.push_str(dir_str);
        }

        match self.nulls {
            NullPrecedence::None => {}
            NullPrecedence::First => r.sql.push_str(" NULLS FIRST"),
            NullPrecedence::Last => r.sql.push_str(" NULLS LAST"),
        }
    }
}

#[cfg(test)]
mod tests {
    use model::core::value::Value;

    use crate::{
        ast::{
            common::{JoinKind, NullPrecedence, OrderDir, TableRef},
            expr::{BinaryOperator, Expr, FunctionCall},
            select::{FromClause, JoinClause, OrderByExpr, Select, TableSource},
        },
        dialect::{Ansi, MySql, Postgres},
        renderer::{Render, Renderer},
    };

    fn table(name: &str) -> TableSource {
        TableSource::Table(TableRef {
            schema: None,
            name: name.to_string(),
        })
    }

    #[test]
    fn test_simple_select_postgres() {
        let ast = Select {
            columns: vec![Expr::qualified("u", "id"), Expr::qualified("u", "name")],
            from: Some(FromClause {
                source: table("users"),
                alias: Some("u".to_string()),
            }),
            where_clause: Some(Expr::binary(
                Expr::qualified("u", "id"),
                BinaryOperator::Eq,
                Expr::Value(Value::Int(123)),
            )),
            ..Default::default()
        };

        let dialect = Postgres;
        let mut renderer = Renderer::new(&dialect);
        ast.render(&mut renderer);
        let (sql, params) = renderer.finish();

        assert_eq!(
            sql,
            r#"SELECT "u"."id", "u"."name" FROM "users" AS "u" WHERE ("u"."id" = $1)"#
        );
        assert_eq!(params, vec![Value::Int(123)]);
    }

    #[test]
    fn test_grouped_select_mysql() {
        let ast = Select {
            columns: vec![
                Expr::qualified("u", "id"),
                Expr::FunctionCall(FunctionCall {
                    name: "COUNT".to_string(),
                    args: vec![Expr::qualified("p", "id")],
                    wildcard: false,
                    distinct: false,
                })
                .aliased(Some("post_count")),
            ],
            from: Some(FromClause {
                source: table("users"),
                alias: Some("u".to_string()),
            }),
            joins: vec![JoinClause {
                kind: JoinKind::Left,
                source: table("posts"),
                alias: Some("p".to_string()),
                on: Expr::binary(
                    Expr::qualified("u", "id"),
                    BinaryOperator::Eq,
                    Expr::qualified("p", "user_id"),
                ),
            }],
            group_by: vec![Expr::qualified("u", "id")],
            having: Some(Expr::binary(
                Expr::FunctionCall(FunctionCall {
                    name: "COUNT".to_string(),
                    args: vec![Expr::qualified("p", "id")],
                    wildcard: false,
                    distinct: false,
                }),
                BinaryOperator::Gt,
                Expr::Value(Value::Int(5)),
            )),
            order_by: vec![OrderByExpr {
                expr: Expr::qualified("u", "name"),
                direction: Some(OrderDir::Asc),
                nulls: NullPrecedence::None,
                ignore_case: true,
            }],
            limit: Some(Expr::Value(Value::Uint(10))),
            ..Default::default()
        };

        let dialect = MySql;
        let mut renderer = Renderer::new(&dialect);
        ast.render(&mut renderer);
        let (sql, params) = renderer.finish();

        let expected_sql = concat!(
            "SELECT `u`.`id`, COUNT(`p`.`id`) AS `post_count` FROM `users` AS `u` ",
            "LEFT JOIN `posts` AS `p` ON (`u`.`id` = `p`.`user_id`) ",
            "GROUP BY `u`.`id` HAVING (COUNT(`p`.`id`) > ?) ",
            "ORDER BY LOWER(`u`.`name`) ASC LIMIT ?"
        );
        assert_eq!(sql, expected_sql);
        assert_eq!(params, vec![Value::Int(5), Value::Uint(10)]);
    }

    #[test]
    fn test_derived_table_numbering_continues() {
        let inner = Select {
            columns: vec![Expr::qualified("o", "customer_id")],
            from: Some(FromClause {
                source: table("order"),
                alias: Some("o".to_string()),
            }),
            where_clause: Some(Expr::binary(
                Expr::qualified("o", "amount"),
                BinaryOperator::Gt,
                Expr::Value(Value::Int(100)),
            )),
            ..Default::default()
        };
        let outer = Select {
            columns: vec![Expr::Wildcard {
                qualifier: Some("big".to_string()),
            }],
            from: Some(FromClause {
                source: TableSource::SubQuery(Box::new(inner)),
                alias: Some("big".to_string()),
            }),
            where_clause: Some(Expr::binary(
                Expr::qualified("big", "customer_id"),
                BinaryOperator::NotEq,
                Expr::Value(Value::Int(7)),
            )),
            order_by: vec![OrderByExpr {
                expr: Expr::qualified("big", "customer_id"),
                direction: Some(OrderDir::Desc),
                nulls: NullPrecedence::Last,
                ignore_case: false,
            }],
            ..Default::default()
        };

        let dialect = Ansi::named();
        let mut renderer = Renderer::new(&dialect);
        outer.render(&mut renderer);
        let (sql, params) = renderer.finish();

        assert_eq!(
            sql,
            concat!(
                "SELECT big.* FROM (SELECT o.customer_id FROM order o WHERE (o.amount > :p1)) big ",
                "WHERE (big.customer_id <> :p2) ORDER BY big.customer_id DESC NULLS LAST"
            )
        );
        assert_eq!(params, vec![Value::Int(100), Value::Int(7)]);
    }
}
