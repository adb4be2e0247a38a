#![allow(clippy::float_cmp)]

use super::*;

/// Run `source` and check that it left only `true` values behind.
fn assert_all_true(source: &str) {
    let mut interp = Interpreter::new();
    interp.run(source).unwrap();
    let stack = interp.operand_stack();
    assert!(!stack.is_empty(), "{source}: empty operand stack");
    for (i, v) in stack.iter().enumerate() {
        assert!(
            v.to_bool().unwrap_or(false),
            "{source}: operand {i} is {}",
            interp.syntax_of(v)
        );
    }
}

fn stdout_of(source: &str) -> String {
    let mut interp = Interpreter::new();
    interp.run(source).unwrap();
    String::from_utf8_lossy(interp.stdout()).into_owned()
}

// ---------------------------------------------------------------------------
// Control flow
// ---------------------------------------------------------------------------

#[test]
fn for_sums_integers() {
    assert_all_true("0 1 1 10 {add} for 55 eq");
}

#[test]
fn for_with_real_increment() {
    assert_all_true("0 0 0.5 2 {add} for 5 eq");
}

#[test]
fn for_counts_down() {
    assert_all_true("0 10 -2 1 {add} for 30 eq");
}

#[test]
fn for_pushes_integers_only_for_integral_operands() {
    assert_all_true("1 1 5 {type /integertype eq} for");
    assert_all_true(
        "[1 1 5 {} for] aload pop \
         5 eq 5 1 roll 4 eq 5 1 roll 3 eq 5 1 roll 2 eq 5 1 roll 1 eq",
    );
    assert_all_true("0 0.5 1 {type /realtype eq} for");
    assert_all_true("[0.0 0.5 1.0 {} for] length 3 eq");
}

#[test]
fn repeat_zero_times_only_consumes_its_operands() {
    assert_all_true("mark 0 {1} repeat counttomark 0 eq exch pop");
}

#[test]
fn repeat_and_loop_exit() {
    assert_all_true("0 4 {1 add} repeat 4 eq");
    assert_all_true("0 {1 add dup 5 eq {exit} if} loop 5 eq");
}

#[test]
fn exit_leaves_only_the_innermost_loop() {
    assert_all_true("0 1 1 3 {1 1 10 {pop add exit} for} for 6 eq");
}

#[test]
fn forall_over_array_and_dict() {
    assert_all_true("0 [1 2 3] {add} forall 6 eq");
    assert_all_true("0 << /a 1 /b 2 >> {exch pop add} forall 3 eq");
}

#[test]
fn stopped_catches_errors_and_stop() {
    assert_all_true("{nosuchname} stopped $error /errorname get /undefined eq");
    assert_all_true("{stop} stopped");
    assert_all_true("{1 pop} stopped not");
}

#[test]
fn stopped_clears_newerror() {
    assert_all_true(
        "{[1] 5 get} stopped /r exch def clear r \
         $error /newerror get not $error /errorname get /rangecheck eq",
    );
}

#[test]
fn error_restores_operands() {
    assert_all_true(
        "{1 0 idiv} stopped 3 1 roll 0 eq exch 1 eq \
         $error /errorname get /undefinedresult eq",
    );
}

#[test]
fn exit_outside_a_loop_is_invalidexit() {
    let mut interp = Interpreter::new();
    interp.run("1 exit").unwrap();
    assert_eq!(
        interp.last_error().map(|e| e.kind),
        Some(ErrorKind::InvalidExit)
    );
}

#[test]
fn exit_cannot_cross_a_stopped_boundary() {
    let mut interp = Interpreter::new();
    interp
        .run("{ {exit} stopped {exit} if } loop $error /errorname get /invalidexit eq")
        .unwrap();
    assert!(interp.last_error().is_none());
    assert_eq!(interp.operand_stack().len(), 1);
    assert!(interp.operand_stack()[0].to_bool().unwrap());
    assert!(interp.cstack.is_empty());
}

#[test]
fn exit_and_stop_leave_no_continuation_frames() {
    let mut interp = Interpreter::new();
    interp.run("0 1 1 10 {pop 1 1 5 {exit} for exit} for").unwrap();
    assert!(interp.cstack.is_empty());
    interp.run("{ {1 1 5 {stop} for} loop } stopped").unwrap();
    assert!(interp.cstack.is_empty());
    let top = interp.operand_stack().last().unwrap();
    assert!(top.to_bool().unwrap());
}

#[test]
fn operand_stack_overflow_is_reported() {
    let mut interp = Interpreter::with_options(Options {
        max_op_stack: 50,
        ..Options::default()
    });
    interp.run("{1} loop").unwrap();
    assert_eq!(
        interp.last_error().map(|e| e.kind),
        Some(ErrorKind::StackOverflow)
    );
    let out = String::from_utf8_lossy(interp.stdout()).into_owned();
    assert!(out.contains("Error: stackoverflow"), "{out}");
    assert!(interp.estack.is_empty());
}

#[test]
fn operand_stack_overflow_can_be_caught() {
    let mut interp = Interpreter::with_options(Options {
        max_op_stack: 50,
        ..Options::default()
    });
    interp
        .run("{ {1} loop } stopped $error /errorname get /stackoverflow eq")
        .unwrap();
    assert!(interp.last_error().is_none());
    let stack = interp.operand_stack();
    assert!(stack.len() < 50);
    assert!(stack[stack.len() - 1].to_bool().unwrap());
    assert!(stack[stack.len() - 2].to_bool().unwrap());
}

#[test]
fn execstack_hides_loop_continuations() {
    let mut interp = Interpreter::new();
    interp
        .run("1 1 1 { pop 10 array execstack 1 get /op exch def } for op")
        .unwrap();
    assert!(interp.last_error().is_none());
    interp
        .run(
            "{ 10 array execstack 1 get /op exch def exit } loop \
             0 1 1 3 { pop op } for",
        )
        .unwrap();
    assert!(interp.last_error().is_none());
}

#[test]
fn stray_continuation_is_a_language_error() {
    let mut interp = Interpreter::new();
    let cont = Value::operator(&crate::operators::control::LOOP_CONT);
    interp.run_object(cont).unwrap();
    assert!(interp.error_pending().unwrap());
    let d = interp.dollar_error().unwrap();
    let name = interp.vm.dict(d).unwrap().get_name("errorname").cloned().unwrap();
    assert_eq!(interp.text_of(&name), b"invalidexit");
}

#[test]
fn exec_of_an_operator_reports_that_operator() {
    assert_all_true(
        "{1 0 /idiv load exec} stopped pop 0 eq exch 1 eq \
         $error /command get /idiv load eq",
    );
    assert_all_true("1 0 /idiv load stopped exch pop exch pop $error /command get /idiv load eq");
}

#[test]
fn executable_string() {
    assert_all_true("(1 2 add) cvx exec 3 eq");
}

#[test]
fn tail_calls_do_not_grow_the_exec_stack() {
    assert_all_true("/f {dup 0 gt {1 sub f} if} def 100000 f 0 eq");
}

#[test]
fn quit_stops_the_program() {
    let mut interp = Interpreter::new();
    interp.run("1 quit 2").unwrap();
    assert_eq!(interp.operand_stack().len(), 1);
}

// ---------------------------------------------------------------------------
// Composite objects and VM
// ---------------------------------------------------------------------------

#[test]
fn dup_shares_the_value() {
    assert_all_true("[1 2 3] dup 0 99 put 0 get 99 eq");
}

#[test]
fn copy_is_independent() {
    assert_all_true("/a [1 2 3] def /b 3 array def a b copy pop b 0 99 put a 0 get 1 eq");
}

#[test]
fn save_restore_rolls_back_local_vm() {
    assert_all_true("/x 1 def save /x 2 def restore x 1 eq");
    assert_all_true("/s (abc) def save s 0 88 put restore s (abc) eq");
}

#[test]
fn global_vm_survives_restore() {
    assert_all_true(
        "true setglobal /g 1 array def false setglobal \
         save g 0 42 put restore g 0 get 42 eq",
    );
}

// ---------------------------------------------------------------------------
// Dictionary stack
// ---------------------------------------------------------------------------

#[test]
fn names_are_byte_strings() {
    let mut interp = Interpreter::new();
    interp
        .run("<80> 1 def <81> 2 def <80> load <80> cvn <81> cvn eq")
        .unwrap();
    let stack = interp.operand_stack();
    assert_eq!(stack.len(), 2);
    assert_eq!(stack[0].to_int().unwrap(), 1);
    assert!(!stack[1].to_bool().unwrap());
}

#[test]
fn where_finds_the_defining_dict() {
    assert_all_true("/x 5 def /x where {/x get 5 eq} {false} ifelse");
    assert_all_true("/nosuchkey where not");
}

#[test]
fn begin_end_scopes_definitions() {
    assert_all_true("/x 1 def 5 dict begin /x 2 def x 2 eq end x 1 eq");
}

#[test]
fn begin_shadows_userdict_until_end() {
    assert_all_true(
        "/k 1 def 1 dict begin /k 2 def k 2 eq /k where pop /k get 2 eq end \
         k 1 eq /k where pop userdict eq",
    );
}

#[test]
fn dictstack_can_be_rebuilt_with_begin() {
    assert_all_true(
        "1 dict begin /k 2 def countdictstack array dictstack end \
         dup length 1 sub get begin k 2 eq end",
    );
}

#[test]
fn count_reports_stack_depth() {
    assert_all_true("clear 1 2 3 count 3 eq 4 1 roll pop pop pop");
}

#[test]
fn save_then_restore_changes_nothing() {
    assert_all_true("/x 1 def /a [1 2] def save restore x 1 eq a 1 get 2 eq a length 2 eq");
}

#[test]
fn dictstack_depth() {
    assert_all_true("countdictstack 3 eq");
    assert_all_true("5 dict begin countdictstack 4 eq end");
    assert_all_true("{end} stopped $error /errorname get /dictstackunderflow eq");
}

// ---------------------------------------------------------------------------
// Unhandled errors
// ---------------------------------------------------------------------------

#[test]
fn unhandled_error_is_reported() {
    let out = stdout_of("1 nosuch 2");
    assert!(
        out.contains("%%[ Error: undefined; OffendingCommand: nosuch ]%%"),
        "{out}"
    );
}

#[test]
fn unhandled_error_ends_the_job() {
    let mut interp = Interpreter::new();
    interp.run("1 nosuch 2").unwrap();
    assert_eq!(
        interp.last_error().map(|e| e.kind),
        Some(ErrorKind::Undefined)
    );
    assert!(!interp.error_pending().unwrap());
}

#[test]
fn runaway_recursion_overflows_the_exec_stack() {
    let mut interp = Interpreter::new();
    interp.run("/f {f pop} def f").unwrap();
    assert_eq!(
        interp.last_error().map(|e| e.kind),
        Some(ErrorKind::ExecStackOverflow)
    );
    let out = String::from_utf8_lossy(interp.stdout()).into_owned();
    assert!(out.contains("Error: execstackoverflow"), "{out}");
}

#[test]
fn custom_errordict_handler_runs() {
    assert_all_true("errordict /undefined {pop true} put nosuch");
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[test]
fn equals_prints_to_stdout() {
    assert_eq!(stdout_of("3 4 add = (hi) print"), "7\nhi");
}

#[test]
fn page_box_comes_from_dsc_header() {
    let mut interp = Interpreter::new();
    interp
        .run("%!PS-Adobe-3.0 EPSF-3.0\n%%BoundingBox: 0 0 100 50\n0 0 10 10 rectfill showpage\n")
        .unwrap();
    assert_eq!(interp.page().max_x, 100.0);
    assert_eq!(interp.pictures().len(), 1);
}
