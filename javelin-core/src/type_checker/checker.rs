use std::{collections::HashMap, sync::Arc};

use tracing::debug;

use crate::{
    analyzer::parsers::unit::IMPLICIT_CLASS_NAME,
    ast::{ClassDecl, CompilationUnit, MethodDecl, Type, TypeName},
    builtins::{is_builtin_class, is_exception_class},
    eval::value::StringValue,
    preprocessor::SourceMap,
    program::{Entry, Global, Method, Program, can_complete_normally},
    tokenizer::keyword::PrimitiveType,
    type_checker::{SymbolKind, TypeCheckError, TypeCheckResult, TypeContext},
};

/// Names and static types of the bindings, in the order they become globals.
pub type BindingTypes = Vec<(String, Type)>;

#[derive(Debug, Clone)]
pub(super) struct MethodSignature {
    pub name: String,
    pub params: Vec<Type>,
    pub returns: Type,
}

/// Main type checker implementation
pub struct TypeChecker {
    pub(super) class_name: String,
    pub(super) methods: Vec<MethodSignature>,
    pub(super) globals: Vec<Global>,
    strings: HashMap<String, Arc<StringValue>>,
    /// Expressions currently being visited, innermost included.
    pub(super) depth: usize,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeChecker {
    pub fn new() -> Self {
        Self {
            class_name: IMPLICIT_CLASS_NAME.to_string(),
            methods: Vec::new(),
            globals: Vec::new(),
            strings: HashMap::new(),
            depth: 0,
        }
    }

    /// Checks `unit` and lowers it into a [`Program`]. The program's source
    /// map is left empty for the caller to fill in.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn check(
        mut self,
        unit: &CompilationUnit,
        bindings: &BindingTypes,
    ) -> TypeCheckResult<Program> {
        for (name, ty) in bindings {
            self.globals.push(Global {
                name: name.clone(),
                ty: ty.clone(),
                init: None,
            });
        }
        let binding_count = self.globals.len();

        let (entry, methods) = match unit {
            CompilationUnit::Expression(expression) => {
                let mut ctx = TypeContext::new();
                let args_slot = self.declare_args(&mut ctx);
                let body = self.visit_expression(expression, &mut ctx)?;
                if body.ty == Type::Void {
                    return Err(TypeCheckError::invalid("';' expected", expression.pos));
                }
                let entry = Entry::Expression {
                    body,
                    frame_size: ctx.scope.frame_size(),
                    args_slot,
                };
                (entry, Vec::new())
            }
            CompilationUnit::Block(statements) => {
                let mut ctx = TypeContext::new();
                let args_slot = self.declare_args(&mut ctx);
                let body = self.visit_statements(statements, &mut ctx)?;
                let entry = Entry::Block {
                    body,
                    frame_size: ctx.scope.frame_size(),
                    args_slot,
                };
                (entry, Vec::new())
            }
            CompilationUnit::Class(class) => self.check_class(class)?,
        };

        debug!(
            class = %self.class_name,
            methods = methods.len(),
            globals = self.globals.len(),
            "type check passed"
        );
        Ok(Program {
            class_name: self.class_name,
            entry,
            methods,
            globals: self.globals,
            binding_count,
            source_map: SourceMap::default(),
        })
    }

    /// Loose code sees the program arguments as `args`, unless a binding
    /// took the name.
    fn declare_args(&self, ctx: &mut TypeContext) -> Option<usize> {
        if self.global_index("args").is_some() {
            return None;
        }
        ctx.scope.declare("args", Type::Array(Box::new(Type::String)))
    }

    fn check_class(&mut self, class: &ClassDecl) -> TypeCheckResult<(Entry, Vec<Method>)> {
        self.class_name = class.name.clone();

        for method in &class.methods {
            let signature = self.method_signature(method)?;
            if self
                .methods
                .iter()
                .any(|m| m.name == signature.name && m.params == signature.params)
            {
                return Err(TypeCheckError::DuplicateMethod {
                    name: method.name.clone(),
                    pos: method.pos,
                });
            }
            self.methods.push(signature);
        }

        // Fields are declared first so that methods and later initializers see them all.
        let first_field = self.globals.len();
        for field in &class.fields {
            let declaration = &field.declaration;
            for declarator in &declaration.declarators {
                let ty = match declaration.ty {
                    TypeName::Var => {
                        return Err(TypeCheckError::invalid(
                            "'var' is not allowed here",
                            declarator.pos,
                        ));
                    }
                    _ => self.resolve_value_type(
                        &declaration.ty.clone().array_of(declarator.extra_dimensions),
                        declarator.pos,
                    )?,
                };
                if self.global_index(&declarator.name).is_some() {
                    return Err(TypeCheckError::DuplicateVariable {
                        name: declarator.name.clone(),
                        pos: declarator.pos,
                    });
                }
                self.globals.push(Global {
                    name: declarator.name.clone(),
                    ty,
                    init: None,
                });
            }
        }

        let mut index = first_field;
        for field in &class.fields {
            for declarator in &field.declaration.declarators {
                if let Some(init) = &declarator.init {
                    let mut ctx = TypeContext::new();
                    let value = self.visit_value(init, &mut ctx)?;
                    let ty = self.globals[index].ty.clone();
                    self.globals[index].init = Some(self.coerce(value, &ty)?);
                }
                index += 1;
            }
        }

        let mut methods = Vec::with_capacity(class.methods.len());
        for (method, signature) in class.methods.iter().zip(self.methods.clone()) {
            methods.push(self.check_method(method, signature)?);
        }

        let string_array = Type::Array(Box::new(Type::String));
        let main = self.methods.iter().position(|m| {
            m.name == "main" && (m.params.is_empty() || m.params == [string_array.clone()])
        });
        if main.is_none() && !class.implicit {
            return Err(TypeCheckError::invalid(
                format!("no main method found in class {}", class.name),
                class.pos,
            ));
        }
        Ok((Entry::Main(main), methods))
    }

    fn method_signature(&self, method: &MethodDecl) -> TypeCheckResult<MethodSignature> {
        let params = method
            .parameters
            .iter()
            .map(|p| self.resolve_value_type(&p.ty, method.pos))
            .collect::<TypeCheckResult<Vec<_>>>()?;
        let returns = self.resolve_type(&method.return_type, method.pos)?;
        Ok(MethodSignature {
            name: method.name.clone(),
            params,
            returns,
        })
    }

    fn check_method(
        &mut self,
        method: &MethodDecl,
        signature: MethodSignature,
    ) -> TypeCheckResult<Method> {
        let mut ctx = TypeContext::for_method(signature.returns.clone());
        for (parameter, ty) in method.parameters.iter().zip(&signature.params) {
            ctx.scope
                .declare(&parameter.name, ty.clone())
                .ok_or_else(|| TypeCheckError::DuplicateVariable {
                    name: parameter.name.clone(),
                    pos: method.pos,
                })?;
        }

        let body = self.visit_statements(&method.body, &mut ctx)?;
        if signature.returns != Type::Void && can_complete_normally(&body) {
            return Err(TypeCheckError::MissingReturn { pos: method.pos });
        }

        debug!(method = %signature.name, frame = ctx.scope.frame_size(), "checked method");
        Ok(Method {
            name: signature.name,
            params: signature.params,
            return_type: signature.returns,
            body,
            frame_size: ctx.scope.frame_size(),
            pos: method.pos,
        })
    }

    /// Resolves a written type. `void` is allowed; `var` is not.
    pub(super) fn resolve_type(&self, ty: &TypeName, pos: usize) -> TypeCheckResult<Type> {
        match ty {
            TypeName::Primitive(primitive) => match primitive {
                PrimitiveType::Int => Ok(Type::Int),
                PrimitiveType::Long => Ok(Type::Long),
                PrimitiveType::Double => Ok(Type::Double),
                PrimitiveType::Boolean => Ok(Type::Boolean),
                PrimitiveType::Char => Ok(Type::Char),
                PrimitiveType::Void => Ok(Type::Void),
                other => Err(TypeCheckError::invalid(
                    format!("'{}' is not supported", other),
                    pos,
                )),
            },
            TypeName::Named(name) => match name.as_str() {
                "String" => Ok(Type::String),
                // Boxed types behave like their primitives.
                "Integer" => Ok(Type::Int),
                "Long" => Ok(Type::Long),
                "Double" => Ok(Type::Double),
                "Boolean" => Ok(Type::Boolean),
                "Character" => Ok(Type::Char),
                name if is_exception_class(name) => Ok(Type::Exception(name.to_string())),
                name => Err(TypeCheckError::undefined(SymbolKind::Class, name, pos)),
            },
            TypeName::Array(inner) => match self.resolve_type(inner, pos)? {
                Type::Void => Err(TypeCheckError::invalid("'void' type not allowed here", pos)),
                element => Ok(Type::Array(Box::new(element))),
            },
            TypeName::Var => Err(TypeCheckError::invalid("'var' is not allowed here", pos)),
        }
    }

    /// Like [`Self::resolve_type`], for variables: `void` is rejected.
    pub(super) fn resolve_value_type(&self, ty: &TypeName, pos: usize) -> TypeCheckResult<Type> {
        match self.resolve_type(ty, pos)? {
            Type::Void => Err(TypeCheckError::invalid("'void' type not allowed here", pos)),
            ty => Ok(ty),
        }
    }

    pub(super) fn global_index(&self, name: &str) -> Option<usize> {
        self.globals.iter().position(|g| g.name == name)
    }

    /// Whether `name` refers to a class rather than a variable here.
    pub(super) fn is_class_name(&self, name: &str, ctx: &TypeContext) -> bool {
        ctx.scope.lookup(name).is_none()
            && self.global_index(name).is_none()
            && (name == self.class_name || is_builtin_class(name) || is_exception_class(name))
    }

    /// Identical string literals share one allocation.
    pub(super) fn intern(&mut self, s: &str) -> Arc<StringValue> {
        self.strings
            .entry(s.to_string())
            .or_insert_with(|| Arc::new(StringValue::new(s)))
            .clone()
    }
}
