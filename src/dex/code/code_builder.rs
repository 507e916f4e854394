use super::{
    BasicBlock, BinaryOp, Branchingness, CatchHandler, CodeTag, CompareMode, Comparison,
    Constant, Instruction, InvokeType, Label, Local, MethodBody, RegisterSpec, Typed, UnaryOp,
};
use crate::dex::types::TypeId;
use crate::dex::{BaseType, Error, FieldId, MethodId};
use crate::util::Width;
use std::collections::HashMap;
use std::convert::TryFrom;

/// Builder for the body of one method
///
/// Code is emitted top to bottom into the _current_ block. Branching instructions end the
/// current block: jumps, returns, and throws leave no block open (until the next label is
/// marked), while conditional branches and throwing instructions inside a `try` open a fresh
/// continuation block right away.
///
/// ### Labels and blocks
///
/// Every basic block is named by a [`Label`]. Labels are _adopted_ by the method the first time
/// they are used (jumped to, branched to, registered as a catch handler, or marked) and block ids
/// are handed out in adoption order when the body is finished. Labels that never receive any
/// instructions are dropped at that point.
///
/// ### Locals and registers
///
/// Locals must all be created before the first instruction is emitted. Registers get assigned by
/// [`Code::initialize_locals`]: ordinary locals come first and parameters last, since the calling
/// convention passes arguments in the highest registers of the frame.
pub struct Code<'g> {
    tag: CodeTag,

    /// Method whose body is being built
    method: MethodId<'g>,

    is_static: bool,

    /// Blocks under construction, indexed by label
    blocks: Vec<BlockUnderConstruction<'g>>,

    /// Labels in the order they were first used
    adoption_order: Vec<Label>,

    /// Block currently accepting instructions
    current_block: Option<Label>,

    this_local: Option<Local<'g>>,

    /// Incoming arguments (including the receiver)
    parameters: Vec<Local<'g>>,

    /// Ordinary locals, created with `new_local`
    locals: Vec<Local<'g>>,

    next_local_index: u32,

    /// Active catch clauses, outermost first
    catches: Vec<(TypeId<'g>, Label)>,

    instructions_emitted: bool,

    /// Set once by `initialize_locals`
    registers: Option<RegisterTable>,
}

/// Just like `BasicBlock`, but not closed off yet
#[derive(Default)]
struct BlockUnderConstruction<'g> {
    adopted: bool,
    marked: bool,
    instructions: Vec<Instruction<'g, Local<'g>>>,
    primary_successor: Option<Label>,
    alternate_successor: Option<Label>,
    catch_handlers: Vec<(TypeId<'g>, Label)>,
}

impl<'g> BlockUnderConstruction<'g> {
    fn successors(&self) -> impl Iterator<Item = Label> + '_ {
        self.primary_successor
            .into_iter()
            .chain(self.alternate_successor)
            .chain(self.catch_handlers.iter().map(|(_, handler)| *handler))
    }
}

struct RegisterTable {
    /// Register of every local, indexed by local
    registers: Vec<u16>,
    register_count: u16,
    parameter_register_count: u16,
}

impl<'g> Code<'g> {
    /// Create a builder for a new method
    ///
    /// The entry block is open right away.
    pub fn new(method: MethodId<'g>, is_static: bool) -> Code<'g> {
        let mut code = Code {
            tag: CodeTag::fresh(),
            method,
            is_static,
            blocks: vec![],
            adoption_order: vec![],
            current_block: None,
            this_local: None,
            parameters: vec![],
            locals: vec![],
            next_local_index: 0,
            catches: vec![],
            instructions_emitted: false,
            registers: None,
        };

        // The initial parameters are just the arguments (including maybe "this")
        if !is_static {
            let this = code.allocate_local(code.method.declaring_type);
            code.this_local = Some(this);
            code.parameters.push(this);
        }
        let parameter_types = code.method.parameters.clone();
        for parameter_type in parameter_types {
            let parameter = code.allocate_local(parameter_type);
            code.parameters.push(parameter);
        }

        let entry = code.new_label();
        let entry_block = &mut code.blocks[entry.index()];
        entry_block.adopted = true;
        entry_block.marked = true;
        code.adoption_order.push(entry);
        code.current_block = Some(entry);

        code
    }

    pub fn method(&self) -> &MethodId<'g> {
        &self.method
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Label of the block accepting instructions, if there is one
    pub fn current_label(&self) -> Option<Label> {
        self.current_block
    }

    /// Number of registers taken by the incoming arguments (including the receiver)
    pub fn param_size(&self) -> usize {
        self.parameters.iter().map(|parameter| parameter.width()).sum()
    }

    /// Whether no instruction was emitted yet
    pub fn is_empty(&self) -> bool {
        !self.instructions_emitted
    }

    /// Generate a fresh label
    pub fn new_label(&mut self) -> Label {
        let label = Label::new(self.tag, self.blocks.len() as u32);
        self.blocks.push(BlockUnderConstruction::default());
        label
    }

    fn allocate_local(&mut self, ty: TypeId<'g>) -> Local<'g> {
        let local = Local::new(self.tag, self.next_local_index, ty);
        self.next_local_index += 1;
        local
    }

    /// Allocate a new local
    ///
    /// This must happen before any instruction is emitted.
    pub fn new_local(&mut self, ty: TypeId<'g>) -> Result<Local<'g>, Error> {
        if self.instructions_emitted || self.registers.is_some() {
            return Err(Error::LocalAfterInstructions);
        }
        if ty.is_void() {
            return Err(Error::VoidNotAllowed("local type"));
        }
        let local = self.allocate_local(ty);
        self.locals.push(local);
        Ok(local)
    }

    /// Get the local holding a parameter (not counting the receiver)
    pub fn get_parameter(&self, index: usize, ty: TypeId<'g>) -> Result<Local<'g>, Error> {
        let count = self.method.parameters.len();
        let offset = if self.is_static { 0 } else { 1 };
        let parameter = if index < count {
            self.parameters.get(index + offset).copied()
        } else {
            None
        };
        let parameter = parameter.ok_or(Error::ParameterOutOfBounds { index, count })?;
        expect_type("parameter", ty, parameter.ty())?;
        Ok(parameter)
    }

    /// Get the local holding the receiver
    pub fn get_this(&self, ty: TypeId<'g>) -> Result<Local<'g>, Error> {
        let this = self
            .this_local
            .ok_or_else(|| Error::NoThisInStaticMethod(format!("{:?}", self.method)))?;
        expect_type("this", ty, this.ty())?;
        Ok(this)
    }

    fn check_label(&self, label: Label) -> Result<(), Error> {
        if label.owner() == self.tag && label.index() < self.blocks.len() {
            Ok(())
        } else {
            Err(Error::ForeignLabel(label))
        }
    }

    fn check_local(&self, local: &Local<'g>) -> Result<(), Error> {
        if local.owner() == self.tag {
            Ok(())
        } else {
            Err(Error::ForeignLocal(format!("{:?}", local)))
        }
    }

    fn adopt(&mut self, label: Label) -> Result<(), Error> {
        self.check_label(label)?;
        let block = &mut self.blocks[label.index()];
        if !block.adopted {
            block.adopted = true;
            self.adoption_order.push(label);
        }
        Ok(())
    }

    /// Start emitting code into the block for the given label
    ///
    /// If a block is still open, it gets closed with a jump to the label.
    pub fn mark(&mut self, label: Label) -> Result<(), Error> {
        self.adopt(label)?;
        let block = &mut self.blocks[label.index()];
        if block.marked {
            return Err(Error::LabelAlreadyMarked(label));
        }
        block.marked = true;

        if self.current_block.is_some() {
            self.jump(label)?;
        }
        self.current_block = Some(label);
        Ok(())
    }

    /// Close the current block with an unconditional jump
    pub fn jump(&mut self, target: Label) -> Result<(), Error> {
        self.adopt(target)?;
        self.add_instruction(Instruction::Goto, Some(target))
    }

    /// Register a handler for exceptions of the given type thrown by the code that follows
    pub fn add_catch_clause(&mut self, exception: TypeId<'g>, handler: Label) -> Result<(), Error> {
        if !exception.is_reference() {
            return Err(type_mismatch("exception type", "reference", exception));
        }
        if self.catches.iter().any(|(caught, _)| *caught == exception) {
            return Err(Error::AlreadyCaught(exception.descriptor().to_owned()));
        }
        self.adopt(handler)?;
        self.catches.push((exception, handler));
        Ok(())
    }

    /// Stop catching exceptions of the given type, returning the label of the handler
    pub fn remove_catch_clause(&mut self, exception: TypeId<'g>) -> Result<Label, Error> {
        let position = self
            .catches
            .iter()
            .position(|(caught, _)| *caught == exception)
            .ok_or_else(|| Error::NoCatchClause(exception.descriptor().to_owned()))?;
        let (_, handler) = self.catches.remove(position);
        Ok(handler)
    }

    /// Active catch clauses, most recently added first
    fn catch_snapshot(&self) -> Vec<(TypeId<'g>, Label)> {
        self.catches.iter().rev().copied().collect()
    }

    /// Push a new instruction to the current block, closing or splitting the block as needed
    fn add_instruction(
        &mut self,
        insn: Instruction<'g, Local<'g>>,
        branch_target: Option<Label>,
    ) -> Result<(), Error> {
        let current = match self.current_block {
            Some(current) => current,
            None => {
                return Err(Error::NoCurrentLabel {
                    instruction: format!("{:?}", insn),
                })
            }
        };
        for operand in insn.operands() {
            self.check_local(operand)?;
        }

        let branchingness = insn.branchingness();
        let can_throw = insn.can_throw();
        log::trace!("{:?}: {:?}", current, insn);
        self.instructions_emitted = true;
        self.blocks[current.index()].instructions.push(insn);

        match branchingness {
            Branchingness::None => {
                if can_throw && !self.catches.is_empty() {
                    let catches = self.catch_snapshot();
                    self.split_current_block(None, catches);
                }
            }
            Branchingness::Goto => {
                self.blocks[current.index()].primary_successor = branch_target;
                self.current_block = None;
            }
            Branchingness::If => self.split_current_block(branch_target, vec![]),
            Branchingness::Return => self.current_block = None,
            Branchingness::Throw => {
                let catches = self.catch_snapshot();
                self.blocks[current.index()].catch_handlers = catches;
                self.current_block = None;
            }
        }
        Ok(())
    }

    /// Close the current block and continue in a fresh block that it falls through to
    fn split_current_block(
        &mut self,
        alternate: Option<Label>,
        catches: Vec<(TypeId<'g>, Label)>,
    ) {
        if let Some(current) = self.current_block {
            let next = self.new_label();
            let next_block = &mut self.blocks[next.index()];
            next_block.adopted = true;
            next_block.marked = true;
            self.adoption_order.push(next);

            let block = &mut self.blocks[current.index()];
            block.primary_successor = Some(next);
            block.alternate_successor = alternate;
            block.catch_handlers = catches;
            log::trace!("Split {:?}, continuing in {:?}", current, next);
            self.current_block = Some(next);
        }
    }

    /// Copy the value of one local into another
    pub fn move_local(&mut self, target: Local<'g>, source: Local<'g>) -> Result<(), Error> {
        expect_type("move", target.ty(), source.ty())?;
        self.add_instruction(
            Instruction::Move {
                dst: target,
                src: source,
            },
            None,
        )
    }

    pub fn load_constant(&mut self, target: Local<'g>, value: Constant<'g>) -> Result<(), Error> {
        if !value.is_assignable_to(target.ty()) {
            return Err(Error::TypeMismatch {
                context: "constant",
                expected: target.ty().descriptor().to_owned(),
                found: value.to_string(),
            });
        }
        self.add_instruction(Instruction::Const { dst: target, value }, None)
    }

    pub fn unary_op(
        &mut self,
        op: UnaryOp,
        target: Local<'g>,
        source: Local<'g>,
    ) -> Result<(), Error> {
        expect_type("unary operand", target.ty(), source.ty())?;
        expect_base("unary operand", source.ty(), |base| op.accepts(base))?;
        self.add_instruction(
            Instruction::Unary {
                op,
                dst: target,
                src: source,
            },
            None,
        )
    }

    pub fn binary_op(
        &mut self,
        op: BinaryOp,
        target: Local<'g>,
        a: Local<'g>,
        b: Local<'g>,
    ) -> Result<(), Error> {
        expect_type("binary operand", target.ty(), a.ty())?;
        if let BinaryOp::Shift(_) = op {
            expect_base("shift amount", b.ty(), |base| base == BaseType::Int)?;
        } else {
            expect_type("binary operand", a.ty(), b.ty())?;
        }
        expect_base("binary operand", a.ty(), |base| op.accepts(base))?;
        self.add_instruction(
            Instruction::Binary {
                op,
                dst: target,
                a,
                b,
            },
            None,
        )
    }

    /// Convert between primitive types
    pub fn numeric_cast(&mut self, target: Local<'g>, source: Local<'g>) -> Result<(), Error> {
        expect_base("numeric cast", target.ty(), |_| true)?;
        expect_base("numeric cast", source.ty(), |_| true)?;
        self.add_instruction(
            Instruction::NumericCast {
                dst: target,
                src: source,
            },
            None,
        )
    }

    /// Cast a reference to the type of the target (throwing if the object is of another type)
    pub fn type_cast(&mut self, target: Local<'g>, source: Local<'g>) -> Result<(), Error> {
        expect_reference("type cast", target.ty())?;
        expect_reference("type cast", source.ty())?;
        self.add_instruction(
            Instruction::CheckCast {
                dst: target,
                src: source,
                class: target.ty(),
            },
            None,
        )
    }

    /// Either a numeric or a type cast, depending on the operands
    pub fn cast(&mut self, target: Local<'g>, source: Local<'g>) -> Result<(), Error> {
        if target.ty().is_primitive() && source.ty().is_primitive() {
            self.numeric_cast(target, source)
        } else if target.ty().is_reference() && source.ty().is_reference() {
            self.type_cast(target, source)
        } else {
            Err(type_mismatch(
                "cast",
                target.ty().descriptor(),
                source.ty(),
            ))
        }
    }

    /// Branch to `true_label` if the comparison holds, otherwise continue in a new block
    pub fn compare(
        &mut self,
        comparison: Comparison,
        true_label: Label,
        a: Local<'g>,
        b: Local<'g>,
    ) -> Result<(), Error> {
        expect_type("comparison", a.ty(), b.ty())?;
        expect_branch_operand(comparison, a.ty())?;
        self.adopt(true_label)?;
        self.add_instruction(
            Instruction::If {
                comparison,
                a,
                b: Some(b),
            },
            Some(true_label),
        )
    }

    /// Like `compare`, but compares against zero (or `null`)
    pub fn compare_z(
        &mut self,
        comparison: Comparison,
        true_label: Label,
        a: Local<'g>,
    ) -> Result<(), Error> {
        expect_branch_operand(comparison, a.ty())?;
        self.adopt(true_label)?;
        self.add_instruction(
            Instruction::If {
                comparison,
                a,
                b: None,
            },
            Some(true_label),
        )
    }

    /// Three-way comparison of two `long`s into an `int`
    pub fn compare_longs(
        &mut self,
        target: Local<'g>,
        a: Local<'g>,
        b: Local<'g>,
    ) -> Result<(), Error> {
        expect_base("comparison result", target.ty(), |base| base == BaseType::Int)?;
        expect_base("long comparison", a.ty(), |base| base == BaseType::Long)?;
        expect_type("long comparison", a.ty(), b.ty())?;
        self.add_instruction(
            Instruction::CompareLongs { dst: target, a, b },
            None,
        )
    }

    /// Three-way comparison of two `float`s or `double`s into an `int`
    pub fn compare_floating_point(
        &mut self,
        target: Local<'g>,
        a: Local<'g>,
        b: Local<'g>,
        mode: CompareMode,
    ) -> Result<(), Error> {
        expect_base("comparison result", target.ty(), |base| base == BaseType::Int)?;
        expect_base("floating point comparison", a.ty(), |base| {
            matches!(base, BaseType::Float | BaseType::Double)
        })?;
        expect_type("floating point comparison", a.ty(), b.ty())?;
        self.add_instruction(
            Instruction::CompareFloatingPoint {
                mode,
                dst: target,
                a,
                b,
            },
            None,
        )
    }

    pub fn iget(
        &mut self,
        field: &FieldId<'g>,
        target: Local<'g>,
        instance: Local<'g>,
    ) -> Result<(), Error> {
        expect_assignable("field value", target.ty(), field.field_type)?;
        expect_assignable("field owner", field.declaring_type, instance.ty())?;
        self.add_instruction(
            Instruction::InstanceGet {
                field: field.clone(),
                dst: target,
                instance,
            },
            None,
        )
    }

    pub fn iput(
        &mut self,
        field: &FieldId<'g>,
        instance: Local<'g>,
        source: Local<'g>,
    ) -> Result<(), Error> {
        expect_assignable("field value", field.field_type, source.ty())?;
        expect_assignable("field owner", field.declaring_type, instance.ty())?;
        self.add_instruction(
            Instruction::InstancePut {
                field: field.clone(),
                instance,
                src: source,
            },
            None,
        )
    }

    pub fn sget(&mut self, field: &FieldId<'g>, target: Local<'g>) -> Result<(), Error> {
        expect_assignable("field value", target.ty(), field.field_type)?;
        self.add_instruction(
            Instruction::StaticGet {
                field: field.clone(),
                dst: target,
            },
            None,
        )
    }

    pub fn sput(&mut self, field: &FieldId<'g>, source: Local<'g>) -> Result<(), Error> {
        expect_assignable("field value", field.field_type, source.ty())?;
        self.add_instruction(
            Instruction::StaticPut {
                field: field.clone(),
                src: source,
            },
            None,
        )
    }

    /// Allocate an object and call its constructor
    pub fn new_instance(
        &mut self,
        target: Local<'g>,
        constructor: &MethodId<'g>,
        args: &[Local<'g>],
    ) -> Result<(), Error> {
        if !constructor.is_constructor() {
            return Err(Error::TypeMismatch {
                context: "constructor",
                expected: String::from("<init>"),
                found: format!("{:?}", constructor),
            });
        }
        expect_assignable("new instance", target.ty(), constructor.declaring_type)?;
        check_arguments(constructor, None, args)?;

        self.add_instruction(
            Instruction::NewInstance {
                dst: target,
                class: constructor.declaring_type,
            },
            None,
        )?;
        let mut all_args = Vec::with_capacity(args.len() + 1);
        all_args.push(target);
        all_args.extend_from_slice(args);
        self.add_instruction(
            Instruction::Invoke {
                invoke_type: InvokeType::Direct,
                method: constructor.clone(),
                args: all_args,
            },
            None,
        )
    }

    /// Call a static method, storing the result in `target` (ignored for `void` methods)
    pub fn invoke_static(
        &mut self,
        method: &MethodId<'g>,
        target: Option<Local<'g>>,
        args: &[Local<'g>],
    ) -> Result<(), Error> {
        self.invoke(InvokeType::Static, method, target, None, args)
    }

    pub fn invoke_virtual(
        &mut self,
        method: &MethodId<'g>,
        target: Option<Local<'g>>,
        instance: Local<'g>,
        args: &[Local<'g>],
    ) -> Result<(), Error> {
        self.invoke(InvokeType::Virtual, method, target, Some(instance), args)
    }

    /// Call a constructor or private method
    pub fn invoke_direct(
        &mut self,
        method: &MethodId<'g>,
        target: Option<Local<'g>>,
        instance: Local<'g>,
        args: &[Local<'g>],
    ) -> Result<(), Error> {
        self.invoke(InvokeType::Direct, method, target, Some(instance), args)
    }

    pub fn invoke_super(
        &mut self,
        method: &MethodId<'g>,
        target: Option<Local<'g>>,
        instance: Local<'g>,
        args: &[Local<'g>],
    ) -> Result<(), Error> {
        self.invoke(InvokeType::Super, method, target, Some(instance), args)
    }

    pub fn invoke_interface(
        &mut self,
        method: &MethodId<'g>,
        target: Option<Local<'g>>,
        instance: Local<'g>,
        args: &[Local<'g>],
    ) -> Result<(), Error> {
        self.invoke(InvokeType::Interface, method, target, Some(instance), args)
    }

    fn invoke(
        &mut self,
        invoke_type: InvokeType,
        method: &MethodId<'g>,
        target: Option<Local<'g>>,
        receiver: Option<Local<'g>>,
        args: &[Local<'g>],
    ) -> Result<(), Error> {
        check_arguments(method, receiver, args)?;
        let result = match (target, method.return_type) {
            (Some(target), Some(return_type)) => {
                expect_assignable("return value", target.ty(), return_type)?;
                Some(target)
            }
            _ => None,
        };

        let mut all_args = Vec::with_capacity(args.len() + 1);
        all_args.extend(receiver);
        all_args.extend_from_slice(args);
        self.add_instruction(
            Instruction::Invoke {
                invoke_type,
                method: method.clone(),
                args: all_args,
            },
            None,
        )?;
        if let Some(result) = result {
            self.add_instruction(Instruction::MoveResult { dst: result }, None)?;
        }
        Ok(())
    }

    pub fn instance_of(
        &mut self,
        target: Local<'g>,
        source: Local<'g>,
        class: TypeId<'g>,
    ) -> Result<(), Error> {
        expect_base("instance-of result", target.ty(), |base| {
            base == BaseType::Boolean
        })?;
        expect_reference("instance-of operand", source.ty())?;
        expect_reference("instance-of type", class)?;
        self.add_instruction(
            Instruction::InstanceOf {
                dst: target,
                src: source,
                class,
            },
            None,
        )
    }

    pub fn array_length(&mut self, target: Local<'g>, array: Local<'g>) -> Result<(), Error> {
        expect_base("array length", target.ty(), |base| base == BaseType::Int)?;
        expect_array(array.ty())?;
        self.add_instruction(
            Instruction::ArrayLength { dst: target, array },
            None,
        )
    }

    /// Allocate an array of the target's type
    pub fn new_array(&mut self, target: Local<'g>, length: Local<'g>) -> Result<(), Error> {
        expect_array(target.ty())?;
        expect_base("array length", length.ty(), |base| base == BaseType::Int)?;
        self.add_instruction(
            Instruction::NewArray {
                dst: target,
                length,
            },
            None,
        )
    }

    pub fn aget(
        &mut self,
        target: Local<'g>,
        array: Local<'g>,
        index: Local<'g>,
    ) -> Result<(), Error> {
        expect_element(array.ty(), target.ty())?;
        expect_base("array index", index.ty(), |base| base == BaseType::Int)?;
        self.add_instruction(
            Instruction::ArrayGet {
                dst: target,
                array,
                index,
            },
            None,
        )
    }

    pub fn aput(
        &mut self,
        array: Local<'g>,
        index: Local<'g>,
        source: Local<'g>,
    ) -> Result<(), Error> {
        expect_element(array.ty(), source.ty())?;
        expect_base("array index", index.ty(), |base| base == BaseType::Int)?;
        self.add_instruction(
            Instruction::ArrayPut {
                array,
                index,
                src: source,
            },
            None,
        )
    }

    pub fn monitor_enter(&mut self, object: Local<'g>) -> Result<(), Error> {
        expect_reference("monitor", object.ty())?;
        self.add_instruction(Instruction::MonitorEnter { object }, None)
    }

    pub fn monitor_exit(&mut self, object: Local<'g>) -> Result<(), Error> {
        expect_reference("monitor", object.ty())?;
        self.add_instruction(Instruction::MonitorExit { object }, None)
    }

    pub fn throw_value(&mut self, throwable: Local<'g>) -> Result<(), Error> {
        expect_reference("thrown value", throwable.ty())?;
        self.add_instruction(Instruction::Throw { value: throwable }, None)
    }

    pub fn return_void(&mut self) -> Result<(), Error> {
        if let Some(return_type) = self.method.return_type {
            return Err(Error::TypeMismatch {
                context: "return",
                expected: return_type.descriptor().to_owned(),
                found: String::from("V"),
            });
        }
        self.add_instruction(Instruction::ReturnVoid, None)
    }

    pub fn return_value(&mut self, result: Local<'g>) -> Result<(), Error> {
        match self.method.return_type {
            None => return Err(type_mismatch("return", "V", result.ty())),
            Some(return_type) => expect_type("return", return_type, result.ty())?,
        }
        self.add_instruction(Instruction::Return { value: result }, None)
    }

    /// Assign registers to all locals
    ///
    /// Ordinary locals get the low registers, in the order they were created. Parameters get the
    /// registers after that (receiver first), and instructions moving each incoming argument into
    /// its register are inserted at the start of the entry block.
    pub fn initialize_locals(&mut self) -> Result<(), Error> {
        if self.registers.is_some() {
            return Err(Error::LocalsAlreadyInitialized);
        }

        let mut registers = vec![0; self.next_local_index as usize];
        let mut next_register = 0;
        for local in &self.locals {
            registers[local.index()] = to_register(next_register)?;
            next_register += local.width();
        }

        let first_parameter_register = next_register;
        let mut parameter_moves = Vec::with_capacity(self.parameters.len());
        for parameter in &self.parameters {
            registers[parameter.index()] = to_register(next_register)?;
            parameter_moves.push(Instruction::MoveParameter {
                dst: *parameter,
                index: to_register(next_register - first_parameter_register)?,
            });
            next_register += parameter.width();
        }

        let register_count = to_register(next_register)?;
        let parameter_register_count = to_register(next_register - first_parameter_register)?;
        if let Some(entry) = self.adoption_order.first() {
            self.blocks[entry.index()]
                .instructions
                .splice(0..0, parameter_moves);
        }

        log::debug!(
            "Assigned {} registers ({} for parameters) in {:?}",
            register_count,
            parameter_register_count,
            self.method
        );
        self.registers = Some(RegisterTable {
            registers,
            register_count,
            parameter_register_count,
        });
        Ok(())
    }

    /// Register assigned to a local
    pub fn register(&self, local: Local<'g>) -> Result<RegisterSpec<'g>, Error> {
        self.check_local(&local)?;
        let table = self.registers.as_ref().ok_or(Error::LocalsNotInitialized)?;
        table
            .registers
            .get(local.index())
            .map(|register| RegisterSpec {
                register: *register,
                ty: local.ty(),
            })
            .ok_or_else(|| Error::ForeignLocal(format!("{:?}", local)))
    }

    /// Finish the method body
    ///
    /// Registers get assigned first if that hasn't happened yet. Fails if a block is still open
    /// or if some block continues into a label that never received any code.
    pub fn to_basic_blocks(&mut self) -> Result<MethodBody<'g>, Error> {
        // Parameter moves alone don't make a body
        if self.is_empty() {
            return Err(Error::MethodCodeNotFinished {
                pending_block: self.adoption_order.first().copied(),
                unplaced_labels: vec![],
            });
        }
        if self.registers.is_none() {
            self.initialize_locals()?;
        }

        let pending_block = self
            .current_block
            .filter(|label| !self.blocks[label.index()].instructions.is_empty());
        let mut unplaced_labels: Vec<Label> = vec![];
        for label in &self.adoption_order {
            let block = &self.blocks[label.index()];
            if block.instructions.is_empty() {
                continue;
            }
            for successor in block.successors() {
                if self.blocks[successor.index()].instructions.is_empty()
                    && !unplaced_labels.contains(&successor)
                {
                    unplaced_labels.push(successor);
                }
            }
        }
        if pending_block.is_some() || !unplaced_labels.is_empty() {
            return Err(Error::MethodCodeNotFinished {
                pending_block,
                unplaced_labels,
            });
        }

        // Empty labels disappear, the others get ids in adoption order
        let surviving: Vec<Label> = self
            .adoption_order
            .iter()
            .copied()
            .filter(|label| !self.blocks[label.index()].instructions.is_empty())
            .collect();
        let block_ids: HashMap<Label, usize> = surviving
            .iter()
            .enumerate()
            .map(|(id, label)| (*label, id))
            .collect();

        let table = self.registers.as_ref().ok_or(Error::LocalsNotInitialized)?;
        let register_of = |local: &Local<'g>| self.register(*local);

        let blocks = surviving
            .iter()
            .enumerate()
            .map(|(id, label)| {
                let block = &self.blocks[label.index()];
                let instructions = block
                    .instructions
                    .iter()
                    .map(|insn| insn.map_registers(&register_of))
                    .collect::<Result<Vec<_>, Error>>()?;
                Ok(BasicBlock {
                    id,
                    instructions,
                    primary_successor: block
                        .primary_successor
                        .and_then(|label| block_ids.get(&label).copied()),
                    alternate_successor: block
                        .alternate_successor
                        .and_then(|label| block_ids.get(&label).copied()),
                    catch_handlers: block
                        .catch_handlers
                        .iter()
                        .filter_map(|(exception, handler)| {
                            block_ids.get(handler).map(|handler| CatchHandler {
                                exception: *exception,
                                handler: *handler,
                            })
                        })
                        .collect(),
                })
            })
            .collect::<Result<Vec<BasicBlock<'g>>, Error>>()?;

        log::debug!(
            "Finished {:?} with {} blocks ({} labels pruned)",
            self.method,
            blocks.len(),
            self.adoption_order.len() - blocks.len()
        );
        Ok(MethodBody {
            blocks,
            register_count: table.register_count,
            parameter_register_count: table.parameter_register_count,
        })
    }
}

fn to_register(index: usize) -> Result<u16, Error> {
    u16::try_from(index).map_err(|_| Error::RegisterOverflow(index))
}

fn type_mismatch(context: &'static str, expected: impl Into<String>, found: TypeId) -> Error {
    Error::TypeMismatch {
        context,
        expected: expected.into(),
        found: found.descriptor().to_owned(),
    }
}

/// Types must be exactly the same
fn expect_type(context: &'static str, expected: TypeId, found: TypeId) -> Result<(), Error> {
    if expected == found {
        Ok(())
    } else {
        Err(type_mismatch(context, expected.descriptor(), found))
    }
}

/// A value of type `found` can be stored in a slot of type `slot`
///
/// There is no class hierarchy, so any reference fits in any reference slot.
fn expect_assignable(context: &'static str, slot: TypeId, found: TypeId) -> Result<(), Error> {
    if slot == found || (slot.is_reference() && found.is_reference()) {
        Ok(())
    } else {
        Err(type_mismatch(context, slot.descriptor(), found))
    }
}

fn expect_reference(context: &'static str, found: TypeId) -> Result<(), Error> {
    if found.is_reference() {
        Ok(())
    } else {
        Err(type_mismatch(context, "reference", found))
    }
}

fn expect_base(
    context: &'static str,
    found: TypeId,
    accepts: impl Fn(BaseType) -> bool,
) -> Result<(), Error> {
    match found.base_type() {
        Some(base_type) if accepts(base_type) => Ok(()),
        _ => Err(type_mismatch(context, "primitive", found)),
    }
}

fn expect_array(found: TypeId) -> Result<(), Error> {
    if found.is_array() {
        Ok(())
    } else {
        Err(type_mismatch("array", "array", found))
    }
}

/// Check that `element` fits in (or comes out of) arrays of type `array`
fn expect_element(array: TypeId, element: TypeId) -> Result<(), Error> {
    let element_descriptor = array
        .element_descriptor()
        .ok_or_else(|| type_mismatch("array", "array", array))?;
    let element_is_reference = element_descriptor.starts_with(&['L', '['][..]);
    if (element_is_reference && element.is_reference())
        || element_descriptor == element.descriptor()
    {
        Ok(())
    } else {
        Err(type_mismatch("array element", element_descriptor, element))
    }
}

/// Only integers (and `int`-like types) get compared by branches, references only for equality
fn expect_branch_operand(comparison: Comparison, found: TypeId) -> Result<(), Error> {
    if found.is_reference() {
        if comparison.is_equality() {
            Ok(())
        } else {
            Err(type_mismatch("reference comparison", "eq or ne", found))
        }
    } else {
        expect_base("comparison", found, |base| base.is_int_like())
    }
}

fn check_arguments<'g>(
    method: &MethodId<'g>,
    receiver: Option<Local<'g>>,
    args: &[Local<'g>],
) -> Result<(), Error> {
    if args.len() != method.parameters.len() {
        return Err(Error::ArgumentCountMismatch {
            method: format!("{:?}", method),
            expected: method.parameters.len(),
            found: args.len(),
        });
    }
    if let Some(receiver) = receiver {
        expect_assignable("receiver", method.declaring_type, receiver.ty())?;
    }
    for (parameter, arg) in method.parameters.iter().zip(args) {
        expect_assignable("argument", *parameter, arg.ty())?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dex::types::{TypeGraph, TypeGraphArenas};
    use crate::dex::ErrorKind;

    #[test]
    fn registers_put_parameters_last() {
        let arenas = TypeGraphArenas::new();
        let types = TypeGraph::new(&arenas);
        let java = types.insert_standard_types();
        let generated = types.get_descriptor("LGenerated;").unwrap();

        let method = generated
            .method(java.long, "f", &[java.int, java.long, java.object])
            .unwrap();
        let mut code = Code::new(method, false);
        let this = code.get_this(generated).unwrap();
        let a = code.get_parameter(0, java.int).unwrap();
        let b = code.get_parameter(1, java.long).unwrap();
        let c = code.get_parameter(2, java.object).unwrap();
        let x = code.new_local(java.double).unwrap();
        let y = code.new_local(java.int).unwrap();
        assert_eq!(code.param_size(), 5);

        code.return_value(b).unwrap();
        assert_eq!(
            code.register(x).unwrap_err().kind(),
            ErrorKind::UsageOrder
        );
        code.initialize_locals().unwrap();

        let register = |local| code.register(local).unwrap().register;
        assert_eq!(register(x), 0);
        assert_eq!(register(y), 2);
        assert_eq!(register(this), 3);
        assert_eq!(register(a), 4);
        assert_eq!(register(b), 5);
        assert_eq!(register(c), 7);

        let body = code.to_basic_blocks().unwrap();
        assert_eq!(body.register_count, 8);
        assert_eq!(body.parameter_register_count, 5);
        assert_eq!(body.blocks.len(), 1);

        let instructions = &body.blocks[0].instructions;
        assert_eq!(instructions.len(), 5);
        assert_eq!(
            instructions[0],
            Instruction::MoveParameter {
                dst: RegisterSpec {
                    register: 3,
                    ty: generated
                },
                index: 0,
            }
        );
        assert_eq!(
            instructions[2],
            Instruction::MoveParameter {
                dst: RegisterSpec {
                    register: 5,
                    ty: java.long
                },
                index: 2,
            }
        );
        assert!(matches!(instructions[4], Instruction::Return { .. }));
    }

    #[test]
    fn locals_only_before_instructions() {
        let arenas = TypeGraphArenas::new();
        let types = TypeGraph::new(&arenas);
        let java = types.insert_standard_types();
        let generated = types.get_descriptor("LGenerated;").unwrap();

        let method = generated.method(java.void, "run", &[]).unwrap();
        let mut code = Code::new(method, true);
        let local = code.new_local(java.int).unwrap();
        code.load_constant(local, Constant::Int(1)).unwrap();

        let err = code.new_local(java.int).unwrap_err();
        assert!(matches!(err, Error::LocalAfterInstructions));
        assert_eq!(err.kind(), ErrorKind::UsageOrder);

        code.return_void().unwrap();
        code.initialize_locals().unwrap();
        assert_eq!(
            code.initialize_locals().unwrap_err().kind(),
            ErrorKind::UsageOrder
        );
    }

    #[test]
    fn parameters_and_receiver() {
        let arenas = TypeGraphArenas::new();
        let types = TypeGraph::new(&arenas);
        let java = types.insert_standard_types();
        let generated = types.get_descriptor("LGenerated;").unwrap();

        let method = generated.method(java.void, "run", &[java.int]).unwrap();
        let code = Code::new(method, true);
        assert_eq!(code.get_this(generated).unwrap_err().kind(), ErrorKind::Type);
        assert_eq!(
            code.get_parameter(0, java.long).unwrap_err().kind(),
            ErrorKind::Type
        );
        assert_eq!(
            code.get_parameter(1, java.int).unwrap_err().kind(),
            ErrorKind::Bounds
        );
        assert!(code.get_parameter(0, java.int).is_ok());
    }

    #[test]
    fn marking_twice() {
        let arenas = TypeGraphArenas::new();
        let types = TypeGraph::new(&arenas);
        let java = types.insert_standard_types();
        let generated = types.get_descriptor("LGenerated;").unwrap();

        let method = generated.method(java.void, "run", &[]).unwrap();
        let mut code = Code::new(method, true);
        let label = code.new_label();
        code.mark(label).unwrap();
        let err = code.mark(label).unwrap_err();
        assert!(matches!(err, Error::LabelAlreadyMarked(_)));
        assert_eq!(err.kind(), ErrorKind::Structural);
    }

    #[test]
    fn marking_open_block_jumps() {
        let arenas = TypeGraphArenas::new();
        let types = TypeGraph::new(&arenas);
        let java = types.insert_standard_types();
        let generated = types.get_descriptor("LGenerated;").unwrap();

        let method = generated.method(java.void, "run", &[]).unwrap();
        let mut code = Code::new(method, true);
        let local = code.new_local(java.int).unwrap();
        code.load_constant(local, Constant::Int(0)).unwrap();
        let next = code.new_label();
        code.mark(next).unwrap();
        code.return_void().unwrap();

        let body = code.to_basic_blocks().unwrap();
        assert_eq!(body.blocks.len(), 2);
        assert_eq!(body.blocks[0].last_instruction(), Some(&Instruction::Goto));
        assert_eq!(body.blocks[0].primary_successor, Some(1));
    }

    #[test]
    fn jump_then_mark() {
        let arenas = TypeGraphArenas::new();
        let types = TypeGraph::new(&arenas);
        let java = types.insert_standard_types();
        let generated = types.get_descriptor("LGenerated;").unwrap();

        let method = generated.method(java.void, "run", &[]).unwrap();
        let mut code = Code::new(method, true);
        let entry = code.current_label();
        assert!(entry.is_some());
        let _never_adopted = code.new_label();
        let target = code.new_label();
        code.jump(target).unwrap();
        assert_eq!(code.current_label(), None);
        code.mark(target).unwrap();
        assert_eq!(code.current_label(), Some(target));
        assert_ne!(entry, Some(target));
        code.return_void().unwrap();

        let body = code.to_basic_blocks().unwrap();
        assert_eq!(body.blocks.len(), 2);
        assert_eq!(body.blocks[0].primary_successor, Some(1));
        assert_eq!(body.blocks[1].primary_successor, None);
    }

    #[test]
    fn compare_splits_block() {
        let arenas = TypeGraphArenas::new();
        let types = TypeGraph::new(&arenas);
        let java = types.insert_standard_types();
        let generated = types.get_descriptor("LGenerated;").unwrap();

        let method = generated
            .method(java.boolean, "call", &[java.int, java.int])
            .unwrap();
        let mut code = Code::new(method, true);
        let a = code.get_parameter(0, java.int).unwrap();
        let b = code.get_parameter(1, java.int).unwrap();
        let result = code.new_local(java.boolean).unwrap();
        let if_body = code.new_label();
        let after_if = code.new_label();

        code.compare(Comparison::LT, if_body, a, b).unwrap();
        code.jump(after_if).unwrap();
        code.mark(if_body).unwrap();
        code.load_constant(result, Constant::Boolean(true)).unwrap();
        code.return_value(result).unwrap();
        code.mark(after_if).unwrap();
        code.load_constant(result, Constant::Boolean(false)).unwrap();
        code.return_value(result).unwrap();

        // entry, if_body, continuation of the comparison, after_if
        let body = code.to_basic_blocks().unwrap();
        assert_eq!(body.blocks.len(), 4);
        let entry = &body.blocks[0];
        assert_eq!(entry.alternate_successor, Some(1));
        assert_eq!(entry.primary_successor, Some(2));
        assert_eq!(body.blocks[2].instructions, vec![Instruction::Goto]);
        assert_eq!(body.blocks[2].primary_successor, Some(3));
        assert_eq!(body.blocks[1].successors(), Vec::<usize>::new());
    }

    #[test]
    fn compare_type_rules() {
        let arenas = TypeGraphArenas::new();
        let types = TypeGraph::new(&arenas);
        let java = types.insert_standard_types();
        let generated = types.get_descriptor("LGenerated;").unwrap();

        let method = generated
            .method(java.void, "run", &[java.long, java.object, java.int])
            .unwrap();
        let mut code = Code::new(method, true);
        let long = code.get_parameter(0, java.long).unwrap();
        let object = code.get_parameter(1, java.object).unwrap();
        let int = code.get_parameter(2, java.int).unwrap();
        let label = code.new_label();

        assert!(code.compare(Comparison::EQ, label, long, long).is_err());
        assert!(code.compare(Comparison::LT, label, int, object).is_err());
        assert!(code.compare_z(Comparison::LT, label, object).is_err());
        code.compare_z(Comparison::EQ, label, object).unwrap();
    }

    #[test]
    fn catch_clauses() {
        let arenas = TypeGraphArenas::new();
        let types = TypeGraph::new(&arenas);
        let java = types.insert_standard_types();
        let generated = types.get_descriptor("LGenerated;").unwrap();
        let exception = types
            .get_descriptor("Ljava/lang/IllegalArgumentException;")
            .unwrap();

        let helper = generated.method(java.void, "helper", &[]).unwrap();
        let method = generated.method(java.void, "run", &[]).unwrap();
        let mut code = Code::new(method, true);
        let handler = code.new_label();

        code.add_catch_clause(exception, handler).unwrap();
        code.invoke_static(&helper, None, &[]).unwrap();
        assert_eq!(code.remove_catch_clause(exception).unwrap(), handler);
        code.invoke_static(&helper, None, &[]).unwrap();
        code.return_void().unwrap();
        code.mark(handler).unwrap();
        code.return_void().unwrap();

        // entry, handler, continuation after the first call
        let body = code.to_basic_blocks().unwrap();
        assert_eq!(body.blocks.len(), 3);
        assert_eq!(
            body.blocks[0].catch_handlers,
            vec![CatchHandler {
                exception,
                handler: 1
            }]
        );
        assert_eq!(body.blocks[0].primary_successor, Some(2));
        assert_eq!(body.blocks[2].instructions.len(), 2);
        assert!(body.blocks[2].catch_handlers.is_empty());
    }

    #[test]
    fn nested_catch_clauses() {
        let arenas = TypeGraphArenas::new();
        let types = TypeGraph::new(&arenas);
        let java = types.insert_standard_types();
        let generated = types.get_descriptor("LGenerated;").unwrap();
        let exception = types
            .get_descriptor("Ljava/lang/IllegalStateException;")
            .unwrap();

        let method = generated.method(java.void, "run", &[java.throwable]).unwrap();
        let mut code = Code::new(method, true);
        let throwable = code.get_parameter(0, java.throwable).unwrap();
        let outer = code.new_label();
        let inner = code.new_label();

        code.add_catch_clause(java.throwable, outer).unwrap();
        code.add_catch_clause(exception, inner).unwrap();
        assert!(matches!(
            code.add_catch_clause(exception, inner),
            Err(Error::AlreadyCaught(_))
        ));
        code.throw_value(throwable).unwrap();
        code.mark(outer).unwrap();
        code.return_void().unwrap();
        code.mark(inner).unwrap();
        code.return_void().unwrap();

        let body = code.to_basic_blocks().unwrap();
        let handlers: Vec<_> = body.blocks[0]
            .catch_handlers
            .iter()
            .map(|catch| (catch.exception, catch.handler))
            .collect();
        assert_eq!(handlers, vec![(exception, 2), (java.throwable, 1)]);
        assert_eq!(body.blocks[0].primary_successor, None);

        assert_eq!(
            code.remove_catch_clause(types.get_descriptor("Ljava/lang/Error;").unwrap())
                .unwrap_err()
                .kind(),
            ErrorKind::Declaration
        );
    }

    #[test]
    fn empty_labels_are_pruned() {
        let arenas = TypeGraphArenas::new();
        let types = TypeGraph::new(&arenas);
        let java = types.insert_standard_types();
        let generated = types.get_descriptor("LGenerated;").unwrap();

        let method = generated.method(java.void, "run", &[]).unwrap();
        let mut code = Code::new(method, true);
        let never_used = code.new_label();
        code.add_catch_clause(java.throwable, never_used).unwrap();
        code.remove_catch_clause(java.throwable).unwrap();
        let first = code.new_label();
        let second = code.new_label();
        code.jump(second).unwrap();
        code.mark(first).unwrap();
        code.return_void().unwrap();
        code.mark(second).unwrap();
        code.jump(first).unwrap();

        let body = code.to_basic_blocks().unwrap();
        let ids: Vec<usize> = body.blocks.iter().map(|block| block.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(body.blocks.iter().all(|block| !block.instructions.is_empty()));

        // adoption order: entry, second, first
        assert_eq!(body.blocks[0].primary_successor, Some(1));
        assert_eq!(body.blocks[1].primary_successor, Some(2));
        assert_eq!(body.blocks[2].last_instruction(), Some(&Instruction::ReturnVoid));
    }

    #[test]
    fn unfinished_code() {
        let arenas = TypeGraphArenas::new();
        let types = TypeGraph::new(&arenas);
        let java = types.insert_standard_types();
        let generated = types.get_descriptor("LGenerated;").unwrap();
        let method = generated.method(java.void, "run", &[]).unwrap();

        let mut code = Code::new(method.clone(), true);
        let local = code.new_local(java.int).unwrap();
        code.load_constant(local, Constant::Int(3)).unwrap();
        match code.to_basic_blocks() {
            Err(Error::MethodCodeNotFinished {
                pending_block: Some(_),
                unplaced_labels,
            }) => assert!(unplaced_labels.is_empty()),
            other => panic!("unexpected {:?}", other),
        }

        let mut code = Code::new(method, true);
        let nowhere = code.new_label();
        code.jump(nowhere).unwrap();
        match code.to_basic_blocks() {
            Err(Error::MethodCodeNotFinished {
                pending_block: None,
                unplaced_labels,
            }) => assert_eq!(unplaced_labels, vec![nowhere]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn empty_bodies_are_unfinished() {
        let arenas = TypeGraphArenas::new();
        let types = TypeGraph::new(&arenas);
        let java = types.insert_standard_types();
        let generated = types.get_descriptor("LGenerated;").unwrap();

        let without_args = generated.method(java.void, "a", &[]).unwrap();
        let with_args = generated.method(java.void, "b", &[java.int]).unwrap();
        for method in [without_args, with_args] {
            let mut code = Code::new(method, true);
            assert!(code.is_empty());
            match code.to_basic_blocks() {
                Err(Error::MethodCodeNotFinished {
                    pending_block: Some(_),
                    unplaced_labels,
                }) => assert!(unplaced_labels.is_empty()),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn no_open_block() {
        let arenas = TypeGraphArenas::new();
        let types = TypeGraph::new(&arenas);
        let java = types.insert_standard_types();
        let generated = types.get_descriptor("LGenerated;").unwrap();

        let method = generated.method(java.void, "run", &[]).unwrap();
        let mut code = Code::new(method, true);
        let local = code.new_local(java.int).unwrap();
        code.return_void().unwrap();
        let err = code.load_constant(local, Constant::Int(1)).unwrap_err();
        assert!(matches!(err, Error::NoCurrentLabel { .. }));
        assert_eq!(err.kind(), ErrorKind::Structural);
    }

    #[test]
    fn foreign_labels_and_locals() {
        let arenas = TypeGraphArenas::new();
        let types = TypeGraph::new(&arenas);
        let java = types.insert_standard_types();
        let generated = types.get_descriptor("LGenerated;").unwrap();

        let method = generated.method(java.int, "run", &[]).unwrap();
        let mut first = Code::new(method.clone(), true);
        let mut second = Code::new(method, true);
        let label = first.new_label();
        let local = first.new_local(java.int).unwrap();

        assert!(matches!(second.mark(label), Err(Error::ForeignLabel(_))));
        assert!(matches!(second.jump(label), Err(Error::ForeignLabel(_))));
        let err = second.return_value(local).unwrap_err();
        assert!(matches!(err, Error::ForeignLocal(_)));
        assert_eq!(err.kind(), ErrorKind::Structural);
    }

    #[test]
    fn return_types() {
        let arenas = TypeGraphArenas::new();
        let types = TypeGraph::new(&arenas);
        let java = types.insert_standard_types();
        let generated = types.get_descriptor("LGenerated;").unwrap();

        let method = generated.method(java.boolean, "call", &[java.int]).unwrap();
        let mut code = Code::new(method, true);
        let int = code.get_parameter(0, java.int).unwrap();
        assert_eq!(code.return_value(int).unwrap_err().kind(), ErrorKind::Type);
        assert_eq!(code.return_void().unwrap_err().kind(), ErrorKind::Type);

        let method = generated.method(java.void, "run", &[java.int]).unwrap();
        let mut code = Code::new(method, true);
        let int = code.get_parameter(0, java.int).unwrap();
        assert_eq!(code.return_value(int).unwrap_err().kind(), ErrorKind::Type);
        code.return_void().unwrap();
    }

    #[test]
    fn void_invoke_ignores_target() {
        let arenas = TypeGraphArenas::new();
        let types = TypeGraph::new(&arenas);
        let java = types.insert_standard_types();
        let generated = types.get_descriptor("LGenerated;").unwrap();

        let helper = generated.method(java.void, "helper", &[java.int]).unwrap();
        let count = generated.method(java.int, "count", &[]).unwrap();
        let method = generated.method(java.void, "run", &[]).unwrap();
        let mut code = Code::new(method, true);
        let local = code.new_local(java.int).unwrap();

        code.invoke_static(&helper, Some(local), &[local]).unwrap();
        code.invoke_static(&count, Some(local), &[]).unwrap();
        assert_eq!(
            code.invoke_static(&helper, None, &[]).unwrap_err().kind(),
            ErrorKind::Type
        );
        code.return_void().unwrap();

        let body = code.to_basic_blocks().unwrap();
        let instructions = &body.blocks[0].instructions;
        assert_eq!(instructions.len(), 4);
        assert!(matches!(instructions[0], Instruction::Invoke { .. }));
        assert!(matches!(instructions[1], Instruction::Invoke { .. }));
        assert!(matches!(instructions[2], Instruction::MoveResult { .. }));
    }

    #[test]
    fn operand_types() {
        let arenas = TypeGraphArenas::new();
        let types = TypeGraph::new(&arenas);
        let java = types.insert_standard_types();
        let generated = types.get_descriptor("LGenerated;").unwrap();
        let int_array = types.array_of(java.int).unwrap();

        let method = generated.method(java.void, "run", &[]).unwrap();
        let mut code = Code::new(method, true);
        let int = code.new_local(java.int).unwrap();
        let long = code.new_local(java.long).unwrap();
        let double = code.new_local(java.double).unwrap();
        let boolean = code.new_local(java.boolean).unwrap();
        let string = code.new_local(java.string).unwrap();
        let object = code.new_local(java.object).unwrap();
        let array = code.new_local(int_array).unwrap();

        assert!(code.load_constant(int, Constant::Long(1)).is_err());
        assert!(code.load_constant(string, Constant::Int(1)).is_err());
        code.load_constant(string, Constant::String(String::from("hi"))).unwrap();
        code.load_constant(object, Constant::Null).unwrap();
        code.load_constant(long, Constant::Long(1)).unwrap();

        assert!(code.move_local(int, long).is_err());
        assert!(code.binary_op(BinaryOp::Add, int, int, long).is_err());
        assert!(code.binary_op(BinaryOp::Xor, double, double, double).is_err());
        assert!(code.unary_op(UnaryOp::Not, boolean, boolean).is_err());
        code.binary_op(BinaryOp::Shift(crate::dex::code::ShiftType::Left), long, long, int)
            .unwrap();
        code.numeric_cast(double, long).unwrap();
        assert!(code.numeric_cast(int, object).is_err());
        code.cast(string, object).unwrap();
        assert!(code.cast(int, object).is_err());
        code.instance_of(boolean, object, java.string).unwrap();
        code.compare_longs(int, long, long).unwrap();
        assert!(code.compare_floating_point(int, long, long, CompareMode::G).is_err());
        code.compare_floating_point(int, double, double, CompareMode::L).unwrap();

        code.load_constant(int, Constant::Int(4)).unwrap();
        code.new_array(array, int).unwrap();
        assert!(code.new_array(object, int).is_err());
        code.array_length(int, array).unwrap();
        code.aput(array, int, int).unwrap();
        assert!(code.aget(long, array, int).is_err());
        assert!(code.aget(int, object, int).is_err());
        code.monitor_enter(object).unwrap();
        assert!(code.monitor_exit(int).is_err());
        code.monitor_exit(object).unwrap();
        code.return_void().unwrap();

        let body = code.to_basic_blocks().unwrap();
        assert_eq!(body.blocks.len(), 1);
    }

    #[test]
    fn throwing_instructions_split_only_inside_try() {
        let arenas = TypeGraphArenas::new();
        let types = TypeGraph::new(&arenas);
        let java = types.insert_standard_types();
        let generated = types.get_descriptor("LGenerated;").unwrap();
        let arithmetic = types
            .get_descriptor("Ljava/lang/ArithmeticException;")
            .unwrap();

        let method = generated
            .method(java.double, "divide", &[java.int, java.double])
            .unwrap();
        let mut code = Code::new(method, true);
        let int = code.get_parameter(0, java.int).unwrap();
        let double = code.get_parameter(1, java.double).unwrap();
        let handler = code.new_label();

        code.binary_op(BinaryOp::Divide, int, int, int).unwrap();
        code.add_catch_clause(arithmetic, handler).unwrap();
        code.binary_op(BinaryOp::Divide, double, double, double).unwrap();
        code.binary_op(BinaryOp::Remainder, int, int, int).unwrap();
        code.remove_catch_clause(arithmetic).unwrap();
        code.return_value(double).unwrap();
        code.mark(handler).unwrap();
        code.return_value(double).unwrap();

        // only the integer remainder inside the try splits the entry block
        let body = code.to_basic_blocks().unwrap();
        assert_eq!(body.blocks.len(), 3);
        assert_eq!(body.blocks[0].instructions.len(), 5);
        assert_eq!(body.blocks[0].catch_handlers.len(), 1);
        assert_eq!(body.blocks[0].primary_successor, Some(2));
        assert_eq!(body.blocks[2].instructions.len(), 1);
    }

    #[test]
    fn listing() {
        let arenas = TypeGraphArenas::new();
        let types = TypeGraph::new(&arenas);
        let java = types.insert_standard_types();
        let generated = types.get_descriptor("LGenerated;").unwrap();

        let method = generated.method(java.int, "identity", &[java.int]).unwrap();
        let mut code = Code::new(method, true);
        let int = code.get_parameter(0, java.int).unwrap();
        code.return_value(int).unwrap();

        let listing = code.to_basic_blocks().unwrap().to_string();
        assert_eq!(
            listing,
            "registers: 1 (parameters: 1)\nblock 0:\n    move-param v0, #0\n    return v0\n"
        );
    }
}
