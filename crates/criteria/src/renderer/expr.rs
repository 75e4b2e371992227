use crate::{
    ast::expr::{BinaryOp, BinaryOperator, Expr, FunctionCall, Ident},
    renderer::{Render, Renderer},
};

impl Render for Expr {
    fn render(&self, r: &mut Renderer) {
        match self {
            Expr::Identifier(ident) => ident.render(r),
            Expr::Wildcard { qualifier } => {
                if let Some(qualifier) = qualifier {
                    r.push_identifier(qualifier);
                    r.sql.push('.');
                }
                r.sql.push('*');
            }
            Expr::Value(val) => r.add_param(val.clone()),
            Expr::Literal(text) => r.sql.push_str(text),
            Expr::BinaryOp(op) => op.render(r),
            Expr::FunctionCall(func) => func.render(r),
            Expr::Alias { expr, alias } => {
                expr.render(r);
                r.sql.push_str(" AS ");
                r.push_identifier(alias);
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                expr.render(r);
                r.sql
                    .push_str(if *negated { " NOT IN (" } else { " IN (" });
                r.render_list(list);
                r.sql.push(')');
            }
            Expr::IsNull { expr, negated } => {
                expr.render(r);
                r.sql.push_str(if *negated {
                    " IS NOT NULL"
                } else {
                    " IS NULL"
                });
            }
            Expr::InSubQuery {
                expr,
                subquery,
                negated,
            } => {
                expr.render(r);
                r.sql
                    .push_str(if *negated { " NOT IN (" } else { " IN (" });
                subquery.render(r);
                r.sql.push(')');
            }
            Expr::Exists { subquery, negated } => {
                if *negated {
                    r.sql.push_str("NOT ");
                }
                r.sql.push_str("EXISTS (");
                subquery.render(r);
                r.sql.push(')');
            }
        }
    }
}

impl Render for Ident {
    fn render(&self, r: &mut Renderer) {
        if let Some(qualifier) = &self.qualifier {
            r.push_identifier(qualifier);
            r.sql.push('.');
        }
        r.push_identifier(&self.name);
    }
}

impl Render for BinaryOp {
    fn render(&self, r: &mut Renderer) {
        r.sql.push('(');
        self.left.render(r);

        let op_str = match self.op {
            BinaryOperator::Eq => " = ",
            BinaryOperator::NotEq => " <> ",
            BinaryOperator::Lt => " < ",
            BinaryOperator::LtEq => " <= ",
            BinaryOperator::Gt => " > ",
            BinaryOperator::GtEq => " >= ",
            BinaryOperator::Like => " LIKE ",
            BinaryOperator::And => " AND ",
            BinaryOperator::Or => " OR ",
        };
        r.sql.push_str(op_str);

        self.right.render(r);
        r.sql.push(')');
    }
}

impl Render for FunctionCall {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str(&self.name);
        r.sql.push('(');
        if self.wildcard {
            r.sql.push('*');
        } else {
            if self.distinct {
                r.sql.push_str("DISTINCT ");
            }
            r.render_list(&self.args);
        }
        r.sql.push(')');
    }
}
