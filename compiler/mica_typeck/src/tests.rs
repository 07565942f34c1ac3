//! End-to-end validation tests: lex, parse, resolve, then check.

use mica_diagnostic::{Handler, Severity};
use mica_ir::{AstArena, Module, NodeId, NodeKind, SharedInterner};
use mica_parse::{parse_source_unit, OperatorTable};
use mica_sema::{Resolver, ScopeTree};
use mica_types::TypeTable;

use crate::TypeChecker;

struct Checked {
    arena: AstArena,
    module: Module,
    handler: Handler,
    interner: SharedInterner,
}

impl Checked {
    fn errors(&self) -> usize {
        self.handler.count(Severity::Error) + self.handler.count(Severity::Critical)
    }

    fn messages(&self) -> Vec<String> {
        self.handler
            .collected()
            .into_iter()
            .map(|d| d.message)
            .collect()
    }

    fn has_message(&self, needle: &str) -> bool {
        self.messages().iter().any(|m| m.contains(needle))
    }

    fn first_decl(&self) -> NodeId {
        match self.arena.kind(self.module.units[0]) {
            NodeKind::SourceUnit { decls, .. } => self.arena.list(decls)[0],
            other => panic!("expected source unit, got {other:?}"),
        }
    }
}

fn check(source: &str) -> Checked {
    let interner = SharedInterner::new();
    let tokens = mica_lexer::lex(source, 0, &interner);
    let ops = OperatorTable::new(&interner);
    let handler = Handler::new();
    let mut arena = AstArena::new();
    let unit = parse_source_unit(
        interner.intern("test.mica"),
        &tokens,
        &mut arena,
        &ops,
        &interner,
        &handler,
    );
    assert!(
        !handler.has_errors(),
        "test source failed to parse: {:?}",
        handler.collected()
    );

    let mut module = Module::new(interner.intern("test"), interner.intern("main"));
    module.units.push(unit);

    let mut scopes = ScopeTree::new();
    let mut types = TypeTable::new(interner.clone());
    Resolver::new(&mut arena, &mut scopes, &mut types, &interner, &handler)
        .resolve_module(&module);

    TypeChecker::new(&mut arena, &scopes, &mut types, &interner, &handler)
        .check_module(&mut module);

    Checked {
        arena,
        module,
        handler,
        interner,
    }
}

/// Check with an entry point appended, for tests that are not about the
/// entry-point rule itself.
fn check_with_main(source: &str) -> Checked {
    check(&format!("{source}\nfunc main() -> Void {{ }}"))
}

// ---- Entry point ----

#[test]
fn minimal_entry_point() {
    let checked = check("func main() -> Void { }");
    assert_eq!(checked.errors(), 0, "{:?}", checked.messages());
    assert!(checked.module.entry_point.is_some());
}

#[test]
fn missing_entry_point_is_an_error() {
    let checked = check("func helper() -> Void { }");
    assert_eq!(checked.errors(), 1);
    assert!(checked.has_message("no entry point specified for module"));
}

#[test]
fn foreign_main_is_not_an_entry_point() {
    let checked = check("foreign func main() -> Void");
    assert!(checked.module.entry_point.is_none());
    assert!(checked.has_message("no entry point specified for module"));

    let checked = check("intrinsic func main() -> Void");
    assert!(checked.module.entry_point.is_none());
    assert!(checked.has_message("no entry point specified for module"));
}

#[test]
fn entry_point_must_be_parameterless() {
    let checked = check("func main(x: Int) -> Void { }");
    assert!(checked.has_message("expected no parameters for program entry point"));
}

#[test]
fn entry_point_must_return_void() {
    let checked = check("func main() -> Int { return 0 }");
    assert!(checked.has_message("return type of program entry point is not 'Void'"));
}

// ---- Enumerations ----

#[test]
fn enum_values_count_from_zero_and_continue_after_initializers() {
    let checked = check_with_main("enum E { case A case B = 5 case C }");
    assert_eq!(checked.errors(), 0, "{:?}", checked.messages());

    let NodeKind::Enum { elements, .. } = checked.arena.kind(checked.first_decl()) else {
        panic!("expected enum");
    };
    let values: Vec<u64> = checked
        .arena
        .list(elements)
        .iter()
        .map(|&element| {
            let NodeKind::EnumElement {
                init: Some(init), ..
            } = checked.arena.kind(element)
            else {
                panic!("initializer not synthesized");
            };
            match checked.arena.kind(init) {
                NodeKind::Int(value) => value,
                other => panic!("expected integer initializer, got {other:?}"),
            }
        })
        .collect();
    assert_eq!(values, vec![0, 5, 6]);
}

#[test]
fn duplicate_enum_value_is_an_error() {
    let checked = check_with_main("enum E { case A = 1 case B = 1 }");
    assert_eq!(checked.errors(), 1);
    assert!(checked.has_message("invalid reuse of value 1"));
}

#[test]
fn non_constant_enum_initializer_is_an_error() {
    let checked = check_with_main(
        "let base: Int = 1\nenum E { case A = base + 1 }",
    );
    assert!(checked.has_message("has to be a constant value"));
}

// ---- Structures ----

#[test]
fn struct_storing_itself_by_value_is_cyclic() {
    let checked = check_with_main("struct S { var x: S }");
    assert_eq!(checked.errors(), 1);
    assert!(checked.has_message("recursively"));
}

#[test]
fn mutually_recursive_structs_are_cyclic() {
    let checked = check_with_main("struct A { var b: B }\nstruct B { var a: A }");
    assert!(checked.has_message("recursively"));
}

#[test]
fn struct_with_pointer_to_self_is_accepted() {
    let checked = check_with_main("struct Node { var next: Node* var value: Int }");
    assert_eq!(checked.errors(), 0, "{:?}", checked.messages());
}

#[test]
fn array_of_self_is_still_cyclic() {
    let checked = check_with_main("struct S { var xs: S[4] }");
    assert!(checked.has_message("recursively"));
}

#[test]
fn void_member_is_rejected() {
    let checked = check_with_main("struct S { var x: Void }");
    assert!(checked.has_message("cannot store 'Void' type as member"));
}

// ---- Functions and return paths ----

#[test]
fn missing_return_on_some_path() {
    let checked = check_with_main("func f(cond: Bool) -> Int { if cond { return 1 } }");
    assert_eq!(checked.errors(), 1);
    assert!(checked.has_message("not all code paths return a value"));
}

#[test]
fn if_else_returning_on_both_branches_suffices() {
    let checked = check_with_main(
        "func sign(x: Int) -> Int { if x > 0 { return 1 } else if x < 0 { return -1 } else { return 0 } }",
    );
    assert_eq!(checked.errors(), 0, "{:?}", checked.messages());
}

#[test]
fn for_loop_with_returning_body_counts_as_returning() {
    let checked = check_with_main("func first(xs: Int[]) -> Int { for x in xs { return x } }");
    assert_eq!(checked.errors(), 0, "{:?}", checked.messages());
}

#[test]
fn exhaustive_switch_with_returning_cases_counts_as_returning() {
    let checked = check_with_main(
        "func pick(b: Bool) -> Int { switch b { case true: return 1 case false: return 0 } }",
    );
    assert_eq!(checked.errors(), 0, "{:?}", checked.messages());
}

#[test]
fn void_parameter_is_rejected() {
    let checked = check_with_main("func f(x: Void) -> Void { }");
    assert!(checked.has_message("cannot pass 'Void' type as parameter"));
}

#[test]
fn return_type_mismatch() {
    let checked = check_with_main("func f() -> Int { return true }");
    assert!(checked.has_message("type mismatch in return statement"));
}

#[test]
fn foreign_functions_skip_body_validation() {
    let checked = check_with_main("foreign func exit(code: Int) -> Void");
    assert_eq!(checked.errors(), 0, "{:?}", checked.messages());
}

// ---- Switches ----

#[test]
fn bool_switch_missing_a_case_is_not_exhaustive() {
    let checked = check_with_main(
        "func f(b: Bool) -> Void { switch b { case true: return } }",
    );
    assert_eq!(checked.errors(), 1);
    assert!(checked.has_message("switch statement must be exhaustive"));
}

#[test]
fn bool_switch_with_both_cases_is_exhaustive() {
    let checked = check_with_main(
        "func f(b: Bool) -> Void { switch b { case true: return case false: return } }",
    );
    assert_eq!(checked.errors(), 0, "{:?}", checked.messages());
}

#[test]
fn enum_switch_over_all_elements_is_exhaustive() {
    let checked = check_with_main(
        "enum Mode { case Idle case Busy }\n\
         func f(m: Mode) -> Void { switch m { case Idle: return case Busy: return } }",
    );
    assert_eq!(checked.errors(), 0, "{:?}", checked.messages());
}

#[test]
fn enum_switch_missing_an_element_is_not_exhaustive() {
    let checked = check_with_main(
        "enum Mode { case Idle case Busy }\n\
         func f(m: Mode) -> Void { switch m { case Idle: return } }",
    );
    assert!(checked.has_message("switch statement must be exhaustive"));
}

#[test]
fn else_case_makes_any_switch_exhaustive() {
    let checked = check_with_main(
        "func f(x: Int) -> Void { switch x { case 1: return else: return } }",
    );
    assert_eq!(checked.errors(), 0, "{:?}", checked.messages());
}

#[test]
fn integer_switch_without_else_is_not_exhaustive() {
    let checked = check_with_main(
        "func f(x: Int) -> Void { switch x { case 1: return case 2: return } }",
    );
    assert!(checked.has_message("switch statement must be exhaustive"));
}

#[test]
fn else_case_must_be_last() {
    let checked = check_with_main(
        "func f(x: Int) -> Void { switch x { else: return case 1: return } }",
    );
    assert!(checked.has_message("has to be the last case"));
}

#[test]
fn empty_case_body_is_an_error() {
    let checked = check_with_main(
        "func f(b: Bool) -> Void { switch b { case true: case false: return } }",
    );
    assert!(checked.has_message("should contain at least one statement"));
}

// ---- Control statements ----

#[test]
fn misplaced_control_statements() {
    let checked = check_with_main("func f() -> Void { break }");
    assert!(checked.has_message("'break' is only allowed inside a switch or loop"));

    let checked = check_with_main("func f() -> Void { continue }");
    assert!(checked.has_message("'continue' is only allowed inside a loop"));

    let checked = check_with_main("func f() -> Void { fallthrough }");
    assert!(checked.has_message("'fallthrough' is only allowed inside a case"));
}

#[test]
fn control_statements_bind_their_targets() {
    let checked = check_with_main(
        "func f(b: Bool) -> Void { while b { break } }",
    );
    assert_eq!(checked.errors(), 0, "{:?}", checked.messages());
}

// ---- Conditions ----

#[test]
fn non_bool_condition_is_an_error() {
    let checked = check_with_main("func f(x: Int) -> Void { if x { } }");
    assert!(checked.has_message("expected type Bool for condition of if statement"));

    let checked = check_with_main("func f(x: Int) -> Void { while x { } }");
    assert!(checked.has_message("expected type Bool for condition of loop statement"));

    let checked = check_with_main("func f(x: Int) -> Void { guard x else { return } }");
    assert!(checked.has_message("expected type Bool for condition of guard statement"));
}

// ---- Assignments and lvalues ----

#[test]
fn assignment_to_literal_is_not_assignable() {
    let checked = check_with_main("func f() -> Void { 1 = 2 }");
    assert!(checked.has_message("not assignable"));
}

#[test]
fn assignment_to_let_is_not_assignable() {
    let checked = check_with_main("func f() -> Void { let x: Int = 1\n x = 2 }");
    assert!(checked.has_message("not assignable"));
}

#[test]
fn assignment_through_member_of_variable() {
    let checked = check_with_main(
        "struct Point { var x: Int var y: Int }\n\
         func f() -> Void { var p: Point\n p.x = 3 }",
    );
    assert_eq!(checked.errors(), 0, "{:?}", checked.messages());
}

#[test]
fn nil_assigns_to_any_pointer() {
    let checked = check_with_main("func f() -> Void { var p: Int*\n p = nil }");
    assert_eq!(checked.errors(), 0, "{:?}", checked.messages());
}

#[test]
fn nil_does_not_assign_to_integers() {
    let checked = check_with_main("func f() -> Void { var x: Int\n x = nil }");
    assert!(checked.has_message("assignment expression has mismatching type"));
}

#[test]
fn variable_initializer_type_must_match() {
    let checked = check_with_main("func f() -> Void { var x: Int = true }");
    assert!(checked.has_message("assignment expression of 'x' has mismatching type"));
}

// ---- Calls and subscripts ----

#[test]
fn call_arity_mismatch() {
    let checked = check_with_main(
        "func add(a: Int, b: Int) -> Int { return a + b }\n\
         func g() -> Void { add(1) }",
    );
    assert!(checked.has_message("invalid argument count expected '2' found '1'"));
}

#[test]
fn call_argument_mismatch_names_the_parameter() {
    let checked = check_with_main(
        "func add(a: Int, b: Int) -> Int { return a + b }\n\
         func g() -> Void { add(1, true) }",
    );
    assert!(checked.has_message("mismatching type for parameter 'b' in 'add'"));
}

#[test]
fn calling_a_non_function_is_an_error() {
    let checked = check_with_main("func f() -> Void { var x: Int\n x(1) }");
    assert!(checked.has_message("cannot call a non function type"));
}

#[test]
fn subscript_requires_one_integer_argument() {
    let checked = check_with_main("func f(xs: Int[]) -> Void { xs[true] }");
    assert!(checked.has_message("type mismatch in argument list of subscript expression"));

    let checked = check_with_main("func f(xs: Int[]) -> Void { xs[1, 2] }");
    assert!(checked.has_message("expected single argument for subscript expression"));
}

// ---- Type operations ----

#[test]
fn bitcast_requires_pointer_operands() {
    let checked = check_with_main("func f(p: Int*) -> Void { var q: Bool* = p as Bool* }");
    assert_eq!(checked.errors(), 0, "{:?}", checked.messages());

    let checked = check_with_main("func f(x: Int) -> Void { x as Bool* }");
    assert!(checked.has_message("bitcast operation only accepts pointer types"));
}

// ---- Error containment and idempotence ----

#[test]
fn unresolved_identifier_reports_once() {
    let checked = check_with_main("func f() -> Void { var x: Int = y }");
    assert_eq!(checked.errors(), 1, "{:?}", checked.messages());
    assert!(checked.has_message("use of unresolved identifier 'y'"));
}

#[test]
fn revalidating_a_module_is_a_no_op() {
    let mut checked = check_with_main("enum E { case A = 1 case B = 1 }");
    let before = checked.errors();

    let scopes = ScopeTree::new();
    let interner = checked.interner.clone();
    let mut types = TypeTable::new(interner.clone());
    TypeChecker::new(
        &mut checked.arena,
        &scopes,
        &mut types,
        &interner,
        &checked.handler,
    )
    .check_module(&mut checked.module);

    assert_eq!(checked.errors(), before);
}

// ---- Operator functions ----

#[test]
fn infix_operator_function_resolves_for_user_types() {
    let checked = check_with_main(
        "struct Vec { var x: Int var y: Int }\n\
         infix func + (a: Vec, b: Vec) -> Vec { return a }\n\
         func f(a: Vec, b: Vec) -> Vec { return a + b }",
    );
    assert_eq!(checked.errors(), 0, "{:?}", checked.messages());
}

#[test]
fn unknown_operator_combination_is_an_error() {
    let checked = check_with_main("func f(b: Bool) -> Void { var x: Int = 1 + b }");
    assert!(checked.has_message("no matching operator function for '+'"));
}
