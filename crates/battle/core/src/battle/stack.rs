//! Continuation stack of resumable steps.
//!
//! Steps are plain serialisable values. A step either finishes its work
//! (optionally pushing sub-steps in reverse execution order first) or
//! suspends, in which case it is pushed back and [`ExecutionStack::execute`]
//! returns the request. The stack, never the host call stack, records where
//! an engagement is.

/// A unit of resumable work.
pub trait Executable<C>: Sized {
    /// What the step hands to the caller when it suspends.
    type Request;
    type Error;

    /// Runs the step. A step that suspends must not have mutated anything
    /// yet, so running it again later is equivalent to running it now.
    fn execute(
        &mut self,
        stack: &mut ExecutionStack<Self>,
        ctx: &mut C,
    ) -> Result<StepControl<Self::Request>, Self::Error>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepControl<R> {
    Done,
    Suspend(R),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StackStatus<R> {
    Drained,
    Suspended(R),
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExecutionStack<S> {
    steps: Vec<S>,
    executing: bool,
}

impl<S> Default for ExecutionStack<S> {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            executing: false,
        }
    }
}

impl<S> ExecutionStack<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: S) {
        self.steps.push(step);
    }

    /// Pushes `steps` so that the first element runs first.
    pub fn push_all(&mut self, steps: impl IntoIterator<Item = S, IntoIter: DoubleEndedIterator>) {
        self.steps.extend(steps.into_iter().rev());
    }

    /// True between the start of a drain and the moment the stack empties,
    /// including while suspended.
    pub fn is_executing(&self) -> bool {
        self.executing
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Next step to run.
    pub fn peek(&self) -> Option<&S> {
        self.steps.last()
    }

    /// Drains steps until the stack is empty or a step suspends.
    ///
    /// On error the remaining steps are discarded and the stack is left idle,
    /// so a retry would start over.
    pub fn execute<C>(&mut self, ctx: &mut C) -> Result<StackStatus<S::Request>, S::Error>
    where
        S: Executable<C>,
    {
        self.executing = true;
        while let Some(mut step) = self.steps.pop() {
            match step.execute(self, ctx) {
                Ok(StepControl::Done) => {}
                Ok(StepControl::Suspend(request)) => {
                    self.steps.push(step);
                    return Ok(StackStatus::Suspended(request));
                }
                Err(err) => {
                    self.steps.clear();
                    self.executing = false;
                    return Err(err);
                }
            }
        }
        self.executing = false;
        Ok(StackStatus::Drained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test step language: `Emit` logs, `Split` expands into children, `Ask`
    /// suspends until an answer is queued.
    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Op {
        Emit(u32),
        Split(Vec<Op>),
        Ask(u32),
        Fail,
    }

    #[derive(Default)]
    struct Log {
        emitted: Vec<u32>,
        answers: Vec<u32>,
    }

    impl Executable<Log> for Op {
        type Request = u32;
        type Error = &'static str;

        fn execute(
            &mut self,
            stack: &mut ExecutionStack<Self>,
            log: &mut Log,
        ) -> Result<StepControl<u32>, &'static str> {
            match self {
                Op::Emit(value) => log.emitted.push(*value),
                Op::Split(children) => stack.push_all(std::mem::take(children)),
                Op::Ask(question) => match log.answers.pop() {
                    Some(answer) => log.emitted.push(answer),
                    None => return Ok(StepControl::Suspend(*question)),
                },
                Op::Fail => return Err("boom"),
            }
            Ok(StepControl::Done)
        }
    }

    fn program() -> Vec<Op> {
        vec![
            Op::Emit(1),
            Op::Split(vec![Op::Emit(2), Op::Ask(7), Op::Emit(3)]),
            Op::Emit(4),
        ]
    }

    #[test]
    fn children_run_before_later_siblings() {
        let mut stack = ExecutionStack::new();
        stack.push_all(vec![Op::Emit(1), Op::Split(vec![Op::Emit(2), Op::Emit(3)]), Op::Emit(4)]);
        let mut log = Log::default();

        assert_eq!(stack.execute(&mut log), Ok(StackStatus::Drained));
        assert_eq!(log.emitted, vec![1, 2, 3, 4]);
        assert!(!stack.is_executing());
    }

    #[test]
    fn suspension_resumes_at_the_next_unexecuted_step() {
        let mut stack = ExecutionStack::new();
        stack.push_all(program());
        let mut log = Log::default();

        assert_eq!(stack.execute(&mut log), Ok(StackStatus::Suspended(7)));
        assert!(stack.is_executing());
        assert_eq!(log.emitted, vec![1, 2]);

        // Persist the continuation and resume from the copy.
        let mut restored = stack.clone();
        log.answers.push(70);
        assert_eq!(restored.execute(&mut log), Ok(StackStatus::Drained));
        assert_eq!(log.emitted, vec![1, 2, 70, 3, 4]);
    }

    #[test]
    fn resumed_run_matches_uninterrupted_run() {
        let mut straight = ExecutionStack::new();
        straight.push_all(program());
        let mut straight_log = Log {
            answers: vec![70],
            ..Log::default()
        };
        straight.execute(&mut straight_log).unwrap();

        let mut interrupted = ExecutionStack::new();
        interrupted.push_all(program());
        let mut log = Log::default();
        interrupted.execute(&mut log).unwrap();
        log.answers.push(70);
        interrupted.execute(&mut log).unwrap();

        assert_eq!(log.emitted, straight_log.emitted);
    }

    #[test]
    fn failure_clears_the_stack() {
        let mut stack = ExecutionStack::new();
        stack.push_all(vec![Op::Emit(1), Op::Fail, Op::Emit(2)]);
        let mut log = Log::default();

        assert_eq!(stack.execute(&mut log), Err("boom"));
        assert!(stack.is_empty());
        assert!(!stack.is_executing());
        assert_eq!(log.emitted, vec![1]);
    }
}
