// Validator tests: curriculum whitelists over lowered programs

use cstep::pipeline::parse_source;
use cstep::validate::{SemanticError, SemanticErrorCode, SemanticValidator, ValidatorLimits};

fn validate(code: &str) -> Result<(), SemanticError> {
    let program = parse_source(code).expect("lowering failed");
    SemanticValidator::new().validate_program(&program)
}

fn reject_code(code: &str) -> SemanticErrorCode {
    validate(code).expect_err("expected a semantic error").code()
}

#[test]
fn accepts_the_supported_surface() {
    let code = r#"
        int counter = 0;
        int grid[2][3];
        void tick(int amount) { counter += amount; }
        int main() {
            for (int i = 0; i < 2; i++) {
                if (i == 0) { tick(1); }
                else if (i == 1) { tick(2); }
                else { tick(3); }
            }
            do { counter--; } while (counter > 2);
            return counter;
        }
    "#;
    assert!(validate(code).is_ok());
}

#[test]
fn revalidation_is_idempotent() {
    let program = parse_source("int main() { return 1 + 2; }").expect("lowering failed");
    let validator = SemanticValidator::new();
    assert!(validator.validate_program(&program).is_ok());
    assert!(validator.validate_program(&program).is_ok());
}

#[test]
fn pointers_are_rejected() {
    assert_eq!(reject_code("int* a;"), SemanticErrorCode::InvalidType);
    assert_eq!(
        reject_code("int main() { int* p; return 0; }"),
        SemanticErrorCode::InvalidType
    );
}

#[test]
fn array_rank_is_capped_at_two() {
    assert_eq!(
        reject_code("int a[2][2][2];"),
        SemanticErrorCode::InvalidType
    );
}

#[test]
fn arrays_cannot_be_parameters() {
    assert_eq!(
        reject_code("int f(int a[3]) { return 0; } int main() { return 0; }"),
        SemanticErrorCode::InvalidType
    );
}

#[test]
fn base_types_are_whitelisted() {
    assert_eq!(reject_code("void x;"), SemanticErrorCode::InvalidType);
    assert_eq!(
        reject_code("char f() { return 0; } int main() { return 0; }"),
        SemanticErrorCode::InvalidType
    );
    assert_eq!(
        reject_code("char c; int main() { return 0; }"),
        SemanticErrorCode::InvalidType
    );
}

#[test]
fn void_is_allowed_as_a_return_type_only() {
    assert!(validate("void f() { } int main() { return 0; }").is_ok());
}

#[test]
fn assignment_operator_whitelist() {
    assert_eq!(
        reject_code("int main() { int a = 1; a ^= 2; return a; }"),
        SemanticErrorCode::UnsupportedAssignOp
    );
    assert_eq!(
        reject_code("int main() { int a = 1; a <<= 2; return a; }"),
        SemanticErrorCode::UnsupportedAssignOp
    );
}

#[test]
fn binary_operator_whitelist() {
    assert_eq!(
        reject_code("int main() { int x = 1; int y = 2; return x & y; }"),
        SemanticErrorCode::UnsupportedBinaryOp
    );
    assert_eq!(
        reject_code("int main() { int x = 1; return x << 2; }"),
        SemanticErrorCode::UnsupportedBinaryOp
    );
}

#[test]
fn unary_operator_whitelist() {
    assert_eq!(
        reject_code("int main() { int x = 1; return ~x; }"),
        SemanticErrorCode::UnsupportedUnaryOp
    );
}

#[test]
fn else_if_clauses_are_traversed() {
    let code = r#"
        int main() {
            int a = 1;
            int b = 2;
            if (a == 0) { return 1; }
            else if (a & b) { return 2; }
            return 0;
        }
    "#;
    assert_eq!(reject_code(code), SemanticErrorCode::UnsupportedBinaryOp);
}

#[test]
fn violations_report_span_and_details() {
    let err = validate("int main() { int x = 1; return ~x; }").unwrap_err();
    assert_eq!(err.code(), SemanticErrorCode::UnsupportedUnaryOp);
    assert!(err.location.line >= 1);
    assert!(err.details.contains('~'));
    assert_eq!(err.node_kind, "UnaryExpr");
}

#[test]
fn limits_are_configurable() {
    let program = parse_source("int* a;").expect("lowering failed");
    let relaxed = SemanticValidator::with_limits(ValidatorLimits {
        max_pointer_depth: 1,
        max_array_rank: 2,
    });
    assert!(relaxed.validate_program(&program).is_ok());

    let strict = SemanticValidator::new();
    assert!(strict.validate_program(&program).is_err());
}
