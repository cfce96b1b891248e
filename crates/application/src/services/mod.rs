mod message_service;
mod user_service;


mod message_service_tests;

pub use message_service::{MessageService, MessageServiceDependencies, SendMessageRequest};
pub use user_service::{
    AuthenticateUserRequest, ChangePasswordRequest, RegisterUserRequest, UpdateUserRequest,
    UserService, UserServiceDependencies,
};
